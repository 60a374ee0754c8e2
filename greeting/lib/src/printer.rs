//! Formatting and output of the greeting lines.

use std::io::{self, Write};

use tracing::{debug, trace};

use crate::error::Result;
use crate::profile::Profile;

/// Number of counter lines; fixed, not derived from any input.
pub const COUNTER_LIMIT: u32 = 3;

/// Renders a salary with exactly two fractional digits.
///
/// ```
/// assert_eq!(greeting::format_salary(2500.7), "2500.70");
/// ```
pub fn format_salary(salary: f64) -> String {
    format!("{salary:.2}")
}

pub fn summary_line(profile: &Profile) -> String {
    format!(
        "Nombre: {} | Edad: {} | Salario: {}",
        profile.name,
        profile.age,
        format_salary(profile.salary)
    )
}

/// `Contador: 0` up to `Contador: {limit - 1}`.
pub fn counter_lines(limit: u32) -> Vec<String> {
    (0..limit).map(|i| format!("Contador: {i}")).collect()
}

/// Prints the greeting for one [`Profile`].
#[derive(Debug, Clone, Default)]
pub struct GreetingPrinter {
    profile: Profile,
}

impl GreetingPrinter {
    pub fn new(profile: Profile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Summary, age category, then the counter lines. No terminators.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(2 + COUNTER_LIMIT as usize);
        lines.push(summary_line(&self.profile));
        lines.push(self.profile.age_category().to_string());
        lines.extend(counter_lines(COUNTER_LIMIT));
        lines
    }

    /// Writes each line followed by `\n`, then flushes.
    ///
    /// ## Errors
    ///
    /// Returns [`GreetingError::Io`](crate::GreetingError::Io) if any write
    /// or the final flush fails.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        for line in self.lines() {
            trace!(%line, "writing line");
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        Ok(())
    }

    /// Writes the greeting to standard output.
    pub fn run(&self) -> Result<()> {
        debug!(
            name = %self.profile.name,
            age = self.profile.age,
            salary = self.profile.salary,
            "printing greeting"
        );
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.write_to(&mut handle)?;
        debug!("greeting printed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GreetingError;

    const EXPECTED: &str = "\
Nombre: Juan | Edad: 30 | Salario: 2500.75
Mayor de edad
Contador: 0
Contador: 1
Contador: 2
";

    /// Writer that fails every write, like a closed pipe.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn default_output_matches_demo_exactly() {
        let mut buf = Vec::new();
        GreetingPrinter::default().write_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), EXPECTED);
    }

    #[test]
    fn output_is_deterministic() {
        let printer = GreetingPrinter::default();
        let mut first = Vec::new();
        let mut second = Vec::new();
        printer.write_to(&mut first).unwrap();
        printer.write_to(&mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn always_five_lines() {
        let printer = GreetingPrinter::new(Profile::new("Ana", 5, 1.0));
        assert_eq!(printer.lines().len(), 5);
    }

    #[test]
    fn minor_profile_selects_minor_line() {
        let lines = GreetingPrinter::new(Profile::new("Ana", 18, 100.0)).lines();
        assert_eq!(lines[1], "Menor de edad");
    }

    #[test]
    fn counter_is_independent_of_profile() {
        let lines = GreetingPrinter::new(Profile::new("Ana", 99, 0.0)).lines();
        assert_eq!(lines[2..], ["Contador: 0", "Contador: 1", "Contador: 2"]);
    }

    #[test]
    fn counter_lines_are_zero_indexed() {
        assert_eq!(counter_lines(COUNTER_LIMIT), vec!["Contador: 0", "Contador: 1", "Contador: 2"]);
        assert!(counter_lines(0).is_empty());
    }

    #[test]
    fn salary_pads_to_two_digits() {
        assert_eq!(format_salary(2500.7), "2500.70");
        assert_eq!(format_salary(2500.0), "2500.00");
        assert_eq!(format_salary(0.0), "0.00");
    }

    #[test]
    fn salary_rounds_extra_precision() {
        assert_eq!(format_salary(2500.756), "2500.76");
        assert_eq!(format_salary(2500.754), "2500.75");
        assert_eq!(format_salary(1999.999), "2000.00");
    }

    #[test]
    fn salary_rounds_the_stored_binary_value() {
        // 2500.755 is stored slightly above the tie, so it rounds up.
        assert_eq!(format_salary(2500.755), "2500.76");
        // 0.125 is an exact tie and goes to the even digit.
        assert_eq!(format_salary(0.125), "0.12");
        assert_eq!(format_salary(0.375), "0.38");
    }

    #[test]
    fn summary_line_substitutes_all_fields() {
        let profile = Profile::new("María", 42, 1234.5);
        assert_eq!(summary_line(&profile), "Nombre: María | Edad: 42 | Salario: 1234.50");
    }

    #[test]
    fn write_failure_propagates() {
        let err = GreetingPrinter::default().write_to(&mut ClosedPipe).unwrap_err();
        match err {
            GreetingError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
