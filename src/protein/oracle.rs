//! Out-of-process fitness evaluation through the REDCRAFT `molan` tool.

use std::io::Write;
use std::process::Command;

use burn::config::Config;
use log::trace;

use crate::{
    env::ScoringOracle,
    error::Error,
    protein::Angles,
};

/// Command line used to score a conformation.
///
/// The angle file path is appended as the final argument.
#[derive(Config, Debug)]
pub struct OracleConfig {
    #[config(default = "String::from(\"redcraft\")")]
    pub program: String,
    #[config(
        default = "vec![\"molan\".into(), \"-e\".into(), \"-dRDC_new\".into(), \"-p\".into(), \".\".into(), \"-m\".into(), \"2\".into()]"
    )]
    pub args: Vec<String>,
}

/// Scores angles by running an external program on a temporary angle file
/// and reading the last whitespace-separated token of its standard output.
#[derive(Debug, Clone)]
pub struct RedcraftOracle {
    program: String,
    args: Vec<String>,
}

impl RedcraftOracle {
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }
}

impl ScoringOracle for RedcraftOracle {
    fn score(&self, angles: &Angles) -> crate::Result<f64> {
        let mut file = tempfile::Builder::new()
            .prefix("angles_")
            .suffix(".txt")
            .tempfile()?;
        writeln!(file, "{angles}")?;
        file.flush()?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(file.path())
            .output()
            .map_err(|e| Error::oracle(format!("could not launch '{}': {e}", self.program)))?;

        if !output.status.success() {
            return Err(Error::oracle(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        trace!("oracle output: {}", stdout.trim());
        parse_score(&stdout)
    }
}

/// Last whitespace-separated token of `output`, as a float.
pub fn parse_score(output: &str) -> crate::Result<f64> {
    let token = output
        .split_whitespace()
        .last()
        .ok_or_else(|| Error::oracle("empty output"))?;
    let score: f64 = token
        .parse()
        .map_err(|_| Error::oracle(format!("unparsable score token '{token}'")))?;
    if !score.is_finite() {
        return Err(Error::oracle(format!("non-finite score '{token}'")));
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score_takes_last_token() {
        assert_eq!(parse_score("RDC fitness: 12.5\n").unwrap(), 12.5);
        assert_eq!(parse_score("  -3e-2  ").unwrap(), -0.03);
    }

    #[test]
    fn test_parse_score_rejects_garbage() {
        assert!(matches!(parse_score(""), Err(Error::Oracle(_))));
        assert!(matches!(parse_score("score: n/a"), Err(Error::Oracle(_))));
        assert!(matches!(parse_score("NaN"), Err(Error::Oracle(_))));
    }

    #[test]
    fn test_default_command_line() {
        let config = OracleConfig::new();
        assert_eq!(config.program, "redcraft");
        assert_eq!(config.args.first().map(String::as_str), Some("molan"));
        assert!(config.args.iter().any(|a| a == "-dRDC_new"));
    }

    #[cfg(unix)]
    fn shell(script: &str) -> RedcraftOracle {
        RedcraftOracle::new(&OracleConfig::new().with_program("sh".into()).with_args(vec![
            "-c".into(),
            script.into(),
        ]))
    }

    #[cfg(unix)]
    #[test]
    fn test_score_reads_angle_file() {
        // $0 is the angle file; echo its contents followed by a score
        let oracle = shell("cat \"$0\"; echo total 42.25");
        let angles = Angles::new(vec![10.0], vec![20.0]).unwrap();
        assert_eq!(oracle.score(&angles).unwrap(), 42.25);
    }

    #[cfg(unix)]
    #[test]
    fn test_score_fails_on_nonzero_exit() {
        let oracle = shell("echo 1.0; exit 3");
        let angles = Angles::filled(1, 0.0).unwrap();
        assert!(matches!(oracle.score(&angles), Err(Error::Oracle(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_score_fails_on_bad_output() {
        let oracle = shell("echo not-a-number");
        let angles = Angles::filled(1, 0.0).unwrap();
        assert!(matches!(oracle.score(&angles), Err(Error::Oracle(_))));
    }

    #[test]
    fn test_missing_program_is_oracle_error() {
        let oracle = RedcraftOracle::new(
            &OracleConfig::new().with_program("definitely-not-a-real-scoring-tool".into()),
        );
        let angles = Angles::filled(1, 0.0).unwrap();
        assert!(matches!(oracle.score(&angles), Err(Error::Oracle(_))));
    }
}
