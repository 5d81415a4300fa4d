//! Prometheus text exposition of a scrape.
//!
//! Every family this exporter publishes is a gauge. Per-bucket families carry a
//! single `bucket` label; exporter families carry none.

use crate::{models::bucket::BucketStatus, services::collection_service::ScrapeReport};
use std::fmt::{self, Write};

/// One gauge family and its samples, each optionally labelled by bucket.
#[derive(Debug, Clone)]
pub struct GaugeFamily {
    pub name: &'static str,
    pub help: &'static str,
    pub samples: Vec<(Option<String>, f64)>,
}

impl GaugeFamily {
    fn single(name: &'static str, help: &'static str, value: f64) -> Self {
        Self {
            name,
            help,
            samples: vec![(None, value)],
        }
    }

    fn write_to(&self, out: &mut String) -> fmt::Result {
        out.push_str("# HELP ");
        out.push_str(self.name);
        out.push(' ');
        push_escaped(out, self.help, false);
        writeln!(out)?;
        writeln!(out, "# TYPE {} gauge", self.name)?;

        for (bucket, value) in &self.samples {
            out.push_str(self.name);
            if let Some(bucket) = bucket {
                out.push_str("{bucket=\"");
                push_escaped(out, bucket, true);
                out.push_str("\"}");
            }
            out.push(' ');
            write_sample_value(out, *value)?;
            writeln!(out)?;
        }
        Ok(())
    }
}

type BucketGauge = (&'static str, &'static str, fn(&BucketStatus) -> f64);

const BUCKET_GAUGES: [BucketGauge; 6] = [
    (
        "bucket_object_count",
        "Number of objects in the bucket",
        |s: &BucketStatus| s.object_count as f64,
    ),
    (
        "bucket_size_bytes",
        "Total bytes stored in the bucket",
        |s: &BucketStatus| s.size_bytes as f64,
    ),
    (
        "bucket_quota_bytes",
        "Bucket quota in bytes, 0 when no quota is configured",
        |s: &BucketStatus| s.quota_bytes as f64,
    ),
    (
        "bucket_used_percent",
        "Share of the bucket quota in use, 0 when no quota is configured",
        |s: &BucketStatus| s.used_percent,
    ),
    (
        "bucket_writable",
        "Whether the probe object could be written (1) or not (0)",
        |s: &BucketStatus| f64::from(u8::from(s.writable)),
    ),
    (
        "bucket_readable",
        "Whether the probe object could be read back intact (1) or not (0)",
        |s: &BucketStatus| f64::from(u8::from(s.readable)),
    ),
];

/// Gauge families for one scrape, per-bucket families first.
pub fn scrape_metrics(report: &ScrapeReport) -> Vec<GaugeFamily> {
    let mut families: Vec<GaugeFamily> = BUCKET_GAUGES
        .iter()
        .map(|&(name, help, value)| GaugeFamily {
            name,
            help,
            samples: report
                .snapshot
                .iter()
                .map(|status| (Some(status.name.clone()), value(status)))
                .collect(),
        })
        .collect();

    families.push(GaugeFamily::single(
        "bucket_exporter_buckets_collected",
        "Buckets reported by the last scrape",
        report.snapshot.len() as f64,
    ));
    families.push(GaugeFamily::single(
        "bucket_exporter_accounts_configured",
        "Accounts configured for scraping",
        report.accounts as f64,
    ));
    families.push(GaugeFamily::single(
        "bucket_exporter_scrape_duration_seconds",
        "Wall time of the last scrape",
        report.duration.as_secs_f64(),
    ));

    families
}

/// Render families in the Prometheus text exposition format.
pub fn render_metrics(families: &[GaugeFamily]) -> String {
    let mut out = String::new();
    for family in families {
        // Writing into a String cannot fail.
        let _ = family.write_to(&mut out);
    }
    out
}

/// Label values escape `\`, `"` and newlines; HELP text only `\` and newlines.
fn push_escaped(out: &mut String, text: &str, quoted: bool) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '"' if quoted => out.push_str("\\\""),
            c => out.push(c),
        }
    }
}

/// Integral values print without a fraction; non-finite values use the
/// exposition spellings.
fn write_sample_value(out: &mut String, value: f64) -> fmt::Result {
    match value {
        v if v.is_nan() => out.write_str("NaN"),
        v if v.is_infinite() => out.write_str(if v > 0.0 { "+Inf" } else { "-Inf" }),
        v if v.fract() == 0.0 && v.abs() < 1e15 => write!(out, "{}", v as i64),
        v => write!(out, "{}", v),
    }
}
