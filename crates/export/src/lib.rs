//! Export helpers for CSV tracks and JSON landing summaries.

pub mod track {
    use std::fs::{self, File};
    use std::io::{self, BufWriter, Write};
    use std::path::Path;

    pub const HEADER: &str = "index,phase,elapsed_s,longitude_deg,latitude_deg,altitude_m";

    /// Create a writer for the target path, handling stdout (`-`) by convention.
    pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
        if path == Path::new("-") {
            return Ok(Box::new(BufWriter::new(io::stdout())));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    /// Write the track CSV header.
    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    /// One track point as a CSV row.
    #[derive(Debug, Clone)]
    pub struct Record<'a> {
        pub index: usize,
        pub phase: &'a str,
        pub elapsed_s: f64,
        pub longitude_deg: f64,
        pub latitude_deg: f64,
        pub altitude_m: f64,
    }

    impl Record<'_> {
        /// Serialize the record to CSV, matching the header ordering.
        pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
            writeln!(
                writer,
                "{},{},{:.3},{:.6},{:.6},{:.2}",
                self.index,
                self.phase,
                self.elapsed_s,
                self.longitude_deg,
                self.latitude_deg,
                self.altitude_m,
            )
        }
    }
}

pub mod summary {
    use serde::Serialize;
    use serde_json::to_writer_pretty;
    use std::fs::{self, File};
    use std::io;
    use std::path::Path;

    /// Geographic point with the elapsed time it was reached at.
    #[derive(Debug, Clone, Copy, Serialize, PartialEq)]
    pub struct Position {
        pub longitude_deg: f64,
        pub latitude_deg: f64,
        pub altitude_m: f64,
        pub elapsed_s: f64,
    }

    /// JSON sidecar describing one prediction.
    #[derive(Debug, Clone, Serialize)]
    pub struct Summary {
        pub source: String,
        pub launch: Position,
        pub cutdown: Position,
        pub landing: Position,
        pub max_altitude_m: f64,
        pub minutes_to_impact: f64,
        pub ascent_steps: usize,
        pub descent_steps: usize,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub sweep: Vec<SweepEntry>,
    }

    /// Landing (or failure) for one cutdown time of a sweep.
    #[derive(Debug, Clone, Serialize)]
    pub struct SweepEntry {
        pub cutdown_minutes: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub landing: Option<Position>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub error: Option<String>,
    }

    /// Write the summary as pretty-printed JSON, creating parent directories.
    pub fn write_summary(path: &Path, summary: &Summary) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        to_writer_pretty(File::create(path)?, summary)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::summary::{Position, Summary, SweepEntry, write_summary};
    use super::track::{Record, write_header};

    #[test]
    fn track_rows_follow_header() {
        let mut out = Vec::new();
        write_header(&mut out).unwrap();
        Record {
            index: 3,
            phase: "descent",
            elapsed_s: 12.5,
            longitude_deg: -76.0,
            latitude_deg: 43.7,
            altitude_m: 950.0,
        }
        .write_to(&mut out)
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("index,phase,elapsed_s,longitude_deg,latitude_deg,altitude_m")
        );
        assert_eq!(lines.next(), Some("3,descent,12.500,-76.000000,43.700000,950.00"));
    }

    #[test]
    fn summary_json_round_trips_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("summary.json");
        let at = |alt: f64, t: f64| Position {
            longitude_deg: -76.0,
            latitude_deg: 43.7,
            altitude_m: alt,
            elapsed_s: t,
        };
        let summary = Summary {
            source: "sounding".into(),
            launch: at(300.0, 0.0),
            cutdown: at(3954.0, 600.0),
            landing: at(290.0, 1200.0),
            max_altitude_m: 3954.0,
            minutes_to_impact: 20.0,
            ascent_steps: 60,
            descent_steps: 74,
            sweep: vec![SweepEntry {
                cutdown_minutes: 5.0,
                landing: None,
                error: Some("descent did not reach terrain".into()),
            }],
        };
        write_summary(&path, &summary).unwrap();
        let value: serde_json::Value =
            serde_json::from_reader(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(value["source"], "sounding");
        assert_eq!(value["cutdown"]["altitude_m"], 3954.0);
        assert_eq!(value["descent_steps"], 74);
        assert!(value["sweep"][0].get("landing").is_none());
    }
}
