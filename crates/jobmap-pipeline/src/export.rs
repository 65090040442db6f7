//! CSV export of the visible job list.

use std::io::{self, Write};

use jobmap_core::{Coordinate, GeocodedJob};

use crate::query::Commute;

pub const CSV_HEADER: &str = "Title,Company,Location,Type,Commute (min),URL";

const BOM: &str = "\u{feff}";

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n')
}

fn escape(field: &str) -> String {
    if needs_quotes(field) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

/// Write `jobs` in order as a BOM-prefixed CSV document, rows separated by
/// `\n`. The commute column is blank where no estimate exists.
///
/// # Errors
///
/// Returns any I/O error from `w`.
pub fn write_jobs_csv<W: Write>(
    mut w: W,
    jobs: &[GeocodedJob],
    reference: Option<Coordinate>,
) -> io::Result<()> {
    write!(w, "{BOM}{CSV_HEADER}")?;
    for job in jobs {
        let minutes = Commute::for_job(job, reference)
            .minutes()
            .map(|m| m.to_string())
            .unwrap_or_default();
        write!(
            w,
            "\n{},{},{},{},{},{}",
            escape(&job.title),
            escape(&job.company),
            escape(&job.location),
            escape(job.workplace_type.label()),
            minutes,
            job.view_url(),
        )?;
    }
    w.flush()
}

/// [`write_jobs_csv`] into a string.
#[must_use]
pub fn jobs_to_csv(jobs: &[GeocodedJob], reference: Option<Coordinate>) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_jobs_csv(&mut buf, jobs, reference);
    String::from_utf8_lossy(&buf).into_owned()
}
