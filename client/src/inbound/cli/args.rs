//! `lifetag` command arguments.

use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use zeroize::Zeroizing;

use crate::domain::Role;
use crate::domain::ports::Coordinates;

/// LifeTag livestock registry client.
#[derive(Debug, Clone, Parser)]
#[command(name = "lifetag", about = "LifeTag livestock registry client", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show the page at a path, applying route guards.
    Open {
        #[arg(value_name = "path", default_value = "/")]
        path: String,
    },
    /// Sign in with a role and its identifier.
    Login {
        #[arg(long, value_parser = parse_role, default_value = "farmer")]
        role: Role,
        /// Aadhaar number for farmers, email for vets and shelters.
        #[arg(long)]
        identifier: String,
        #[command(flatten)]
        password: PasswordSource,
    },
    /// Create an account. Pass `--set role=vet` to pick a role.
    Signup {
        #[arg(long = "set", value_name = "field=value", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
    /// INAPH account flows.
    Inaph {
        #[command(subcommand)]
        action: InaphCommand,
    },
    /// End the session.
    Logout,
    /// Show who is signed in.
    Whoami,
    /// Cattle registry.
    Cattle {
        #[command(subcommand)]
        action: CattleCommand,
    },
    /// Stray cattle complaints.
    Complaint {
        #[command(subcommand)]
        action: ComplaintCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum InaphCommand {
    /// Sign in with an INAPH ID.
    Login {
        #[arg(long = "inaph-id")]
        inaph_id: String,
        /// Leave the password out to check whether the ID has one yet.
        #[command(flatten)]
        password: PasswordSource,
    },
    /// Create the password for an INAPH ID.
    CreatePassword {
        #[arg(long = "inaph-id")]
        inaph_id: String,
        #[arg(long = "new-password", env = "LIFETAG_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
        /// Read the new password from the first line of standard input.
        #[arg(long = "new-password-stdin", conflicts_with = "new_password")]
        new_password_stdin: bool,
    },
}

/// Where a password is read from.
///
/// `--password` shows up in the process list; `LIFETAG_PASSWORD` or
/// `--password-stdin` keep it out of argv.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct PasswordSource {
    #[arg(long = "password", env = "LIFETAG_PASSWORD", hide_env_values = true)]
    pub value: Option<String>,
    /// Read the password from the first line of standard input.
    #[arg(long = "password-stdin", conflicts_with = "value")]
    pub from_stdin: bool,
}

impl PasswordSource {
    /// A password given inline.
    pub fn inline(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            from_stdin: false,
        }
    }

    /// Produce the password, reading one line from `input` when asked to.
    ///
    /// The trailing line break is dropped. `None` means no password was
    /// supplied at all.
    ///
    /// # Errors
    ///
    /// Returns an error when `input` cannot be read.
    pub fn resolve(self, input: &mut dyn BufRead) -> io::Result<Option<Zeroizing<String>>> {
        if !self.from_stdin {
            return Ok(self.value.map(Zeroizing::new));
        }
        let mut line = Zeroizing::new(String::new());
        input.read_line(&mut line)?;
        let len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(len);
        Ok(Some(line))
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum CattleCommand {
    /// Register an animal for the signed-in farmer.
    Add {
        #[arg(long = "set", value_name = "field=value", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
        #[arg(long, value_name = "path")]
        photo: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ComplaintCommand {
    /// Report abandoned cattle.
    Submit {
        #[arg(long = "set", value_name = "field=value", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
        #[arg(long, value_name = "path")]
        photo: Option<PathBuf>,
        /// Fill the location from `lat,lon`.
        #[arg(long, value_name = "lat,lon", value_parser = parse_coordinates)]
        gps: Option<Coordinates>,
    },
}

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.parse().map_err(|err: crate::domain::UnknownRole| err.to_string())
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got `{raw}`"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in `{raw}`"));
    }
    Ok((field.to_owned(), value.to_owned()))
}

fn parse_coordinates(raw: &str) -> Result<Coordinates, String> {
    let (latitude, longitude) = raw
        .split_once(',')
        .ok_or_else(|| "coordinates must be `lat,lon`".to_owned())?;
    let parse = |value: &str| {
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .ok_or_else(|| format!("`{value}` is not a coordinate"))
    };
    let latitude = parse(latitude)?;
    let longitude = parse(longitude)?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("coordinates out of range: {raw}"));
    }
    Ok(Coordinates::new(latitude, longitude))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("breed=Gir", ("breed", "Gir"))]
    #[case("description=a=b", ("description", "a=b"))]
    #[case(" weight =", ("weight", ""))]
    fn assignments_split_on_the_first_equals(#[case] raw: &str, #[case] expected: (&str, &str)) {
        assert_eq!(
            parse_assignment(raw),
            Ok((expected.0.to_owned(), expected.1.to_owned()))
        );
    }

    #[rstest]
    #[case("breed")]
    #[case("=Gir")]
    fn malformed_assignments_are_rejected(#[case] raw: &str) {
        assert!(parse_assignment(raw).is_err());
    }

    #[rstest]
    #[case("26.9,75.8", Some((26.9, 75.8)))]
    #[case(" -12.5 , 130 ", Some((-12.5, 130.0)))]
    #[case("91,0", None)]
    #[case("NaN,0", None)]
    #[case("26.9", None)]
    fn coordinates_parse_within_range(#[case] raw: &str, #[case] expected: Option<(f64, f64)>) {
        assert_eq!(
            parse_coordinates(raw).ok(),
            expected.map(|(lat, lon)| Coordinates::new(lat, lon))
        );
    }

    #[test]
    fn login_defaults_to_farmer() {
        let cli = Cli::try_parse_from([
            "lifetag",
            "login",
            "--identifier",
            "1234 5678 9012",
            "--password",
            "pw",
        ])
        .expect("parse");
        let Command::Login { role, .. } = cli.command else {
            panic!("expected login");
        };
        assert_eq!(role, Role::Farmer);
    }

    #[test]
    fn repeated_set_flags_collect_in_order() {
        let cli = Cli::try_parse_from([
            "lifetag", "cattle", "add", "--set", "species=Cow", "--set", "breed=Gir", "--photo",
            "cow.png",
        ])
        .expect("parse");
        let Command::Cattle {
            action: CattleCommand::Add { fields, photo },
        } = cli.command
        else {
            panic!("expected cattle add");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(photo, Some(PathBuf::from("cow.png")));
    }

    #[test]
    fn password_can_come_from_stdin() {
        let cli = Cli::try_parse_from([
            "lifetag",
            "login",
            "--identifier",
            "vet@example.com",
            "--password-stdin",
        ])
        .expect("parse");
        let Command::Login { password, .. } = cli.command else {
            panic!("expected login");
        };
        let mut input = io::Cursor::new("s3cret\r\nignored\n");
        let resolved = password.resolve(&mut input).expect("read");
        assert_eq!(resolved.as_deref().map(String::as_str), Some("s3cret"));
    }

    #[test]
    fn password_flag_and_stdin_conflict() {
        assert!(
            Cli::try_parse_from([
                "lifetag",
                "login",
                "--identifier",
                "x",
                "--password",
                "y",
                "--password-stdin",
            ])
            .is_err()
        );
    }

    #[test]
    fn inline_password_ignores_input() {
        let mut input = io::Cursor::new("from stdin\n");
        let resolved = PasswordSource::inline("pw").resolve(&mut input).expect("read");
        assert_eq!(resolved.as_deref().map(String::as_str), Some("pw"));
        assert_eq!(
            PasswordSource::default().resolve(&mut input).expect("read"),
            None
        );
    }

    #[test]
    fn unknown_roles_are_rejected() {
        assert!(
            Cli::try_parse_from([
                "lifetag", "login", "--role", "admin", "--identifier", "x", "--password", "y"
            ])
            .is_err()
        );
    }
}
