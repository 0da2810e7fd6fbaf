//! Prints the end-of-run summary table: one row per test binary.

use std::time::Duration;

pub struct Row {
    pub target: String,
    pub binary: String,
    pub build_ok: bool,
    pub run_ok: Option<bool>,
    pub duration: Duration,
}

pub fn render(rows: &[Row]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<20} {:<40} {:<8} {:<8} {:>8}\n", "TARGET", "BINARY", "BUILD", "RUN", "TIME"));
    for row in rows {
        let build = if row.build_ok { "ok" } else { "FAIL" };
        let run = match row.run_ok {
            Some(true) => "ok",
            Some(false) => "FAIL",
            None => "-",
        };
        out.push_str(&format!(
            "{:<20} {:<40} {:<8} {:<8} {:>7.1}s\n",
            row.target,
            row.binary,
            build,
            run,
            row.duration.as_secs_f64()
        ));
    }
    let failed = rows.iter().filter(|r| !r.build_ok || r.run_ok == Some(false)).count();
    out.push_str(&format!("\n{} target(s), {} failed\n", rows.len(), failed));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_zero_failures_when_everything_passes() {
        let rows = vec![Row {
            target: "broker-pool".to_string(),
            binary: "broker_pool-abc".to_string(),
            build_ok: true,
            run_ok: Some(true),
            duration: Duration::from_millis(250),
        }];
        let text = render(&rows);
        assert!(text.contains("1 target(s), 0 failed"));
    }

    #[test]
    fn a_build_failure_never_attempted_a_run() {
        let rows = vec![Row {
            target: "broker-reset".to_string(),
            binary: "(build failed)".to_string(),
            build_ok: false,
            run_ok: None,
            duration: Duration::from_millis(50),
        }];
        let text = render(&rows);
        assert!(text.contains("FAIL"));
        assert!(text.contains("1 target(s), 1 failed"));
    }
}
