use crate::stress::{ResultLog, SearchState};
use std::fmt;

/// Result log rendered as an aligned table.
pub struct LogTable<'a>(pub &'a ResultLog);

impl fmt::Display for LogTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>10} {:>15} {:>11}", "Load_kW", "Trafo_Load_Pct", "Voltage_PU")?;
        for r in self.0 {
            writeln!(
                f,
                "{:>10.0} {:>15.2} {:>11.4}",
                r.load_kw, r.transformer_loading_pct, r.bus_voltage_pu
            )?;
        }
        Ok(())
    }
}

/// How the search ended and the largest safe load found.
pub struct Summary<'a> {
    pub log: &'a ResultLog,
    pub state: SearchState,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Steps solved: {}", self.log.len())?;

        match (self.state, self.log.last()) {
            (SearchState::StoppedAtOverload, Some(r)) => writeln!(
                f,
                "Limit reached: transformer overload ({:.1}%) at {:.0} kW",
                r.transformer_loading_pct, r.load_kw
            )?,
            (SearchState::StoppedAtUndervoltage, Some(r)) => writeln!(
                f,
                "Limit reached: voltage drop violation ({:.3} pu) at {:.0} kW",
                r.bus_voltage_pu, r.load_kw
            )?,
            (state, _) => writeln!(f, "Stopped: {}", state)?,
        }

        match self.log.max_safe_load_kw(self.state) {
            Some(kw) => writeln!(f, "Maximum safe load: {:.0} kW", kw),
            None => writeln!(f, "Maximum safe load: none"),
        }
    }
}

/// Renders the result log as an aligned table.
pub fn format_log(log: &ResultLog) -> String {
    LogTable(log).to_string()
}

/// Summarises how the search ended and the largest safe load found.
pub fn summary(log: &ResultLog, state: SearchState) -> String {
    Summary { log, state }.to_string()
}
