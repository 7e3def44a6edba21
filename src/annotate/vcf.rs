//! Access to the VCF input: reader construction and extraction of the per-record
//! fields that the annotation works on.

use std::io::BufRead;
use std::path::Path;

use noodles::vcf;
use noodles::vcf::variant::record_buf::info::field::{value::Array, Value};
use noodles::vcf::variant::RecordBuf;

use crate::common::io::open_read_maybe_gz;

/// Alias for the VCF reader type that we will use.
pub type VcfReader = vcf::io::Reader<Box<dyn BufRead>>;

/// Helper function that opens one VCF reader at the given path.
///
/// Transparently decompresses gzip and bgzip input.
pub fn open_vcf_reader(path: impl AsRef<Path>) -> Result<VcfReader, anyhow::Error> {
    Ok(vcf::io::Reader::new(open_read_maybe_gz(path).map_err(
        |e| anyhow::anyhow!("could not build VCF reader: {}", e),
    )?))
}

/// The fields of one VCF record that the annotation consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    /// Chromosome name.
    pub chrom: String,
    /// 1-based position.
    pub pos: usize,
    /// Reference allele.
    pub reference: String,
    /// Alternate alleles, in the order declared in the input file.
    pub alternate: Vec<String>,
    /// Total read depth at the site (`INFO/DP`).
    pub depth: i32,
    /// Read observation count per alternate allele (`INFO/AO`).
    pub alt_observations: Vec<i32>,
    /// Reference allele observation count (`INFO/RO`).
    pub ref_observations: i32,
    /// Caller-assigned type per alternate allele (`INFO/TYPE`).
    pub var_types: Vec<String>,
}

impl VariantRecord {
    /// Extract a `VariantRecord` from a parsed VCF record.
    ///
    /// Fails if the position or any of the required INFO fields is missing or
    /// has an unexpected type.
    pub fn from_record_buf(record: &RecordBuf) -> Result<Self, anyhow::Error> {
        let chrom = record.reference_sequence_name().to_string();
        let pos = record
            .variant_start()
            .map(|p| p.get())
            .ok_or_else(|| anyhow::anyhow!("missing position in VCF record"))?;
        let reference = record.reference_bases().to_string();
        let alternate = record
            .alternate_bases()
            .as_ref()
            .iter()
            .map(|alt| alt.to_string())
            .collect::<Vec<_>>();
        if alternate.is_empty() {
            anyhow::bail!("record {}:{} has no alternate alleles", &chrom, pos);
        }

        Ok(Self {
            depth: info_integer(record, "DP", &chrom, pos)?,
            alt_observations: info_integers(record, "AO", &chrom, pos)?,
            ref_observations: info_integer(record, "RO", &chrom, pos)?,
            var_types: info_strings(record, "TYPE", &chrom, pos)?,
            chrom,
            pos,
            reference,
            alternate,
        })
    }

    /// Key of the record in the consequence map: `chrom_pos_ref/alt1[/alt2...]`,
    /// using this record's own alternate allele order.
    pub fn site_key(&self) -> String {
        format!(
            "{}_{}_{}/{}",
            self.chrom,
            self.pos,
            self.reference,
            self.alternate.join("/")
        )
    }
}

/// Extract a single integer INFO value, also accepting a one-element array.
fn info_integer(
    record: &RecordBuf,
    key: &str,
    chrom: &str,
    pos: usize,
) -> Result<i32, anyhow::Error> {
    match record.info().get(key) {
        Some(Some(Value::Integer(value))) => Ok(*value),
        Some(Some(Value::Array(Array::Integer(values)))) if values.len() == 1 => values[0]
            .ok_or_else(|| anyhow::anyhow!("empty INFO/{} value in record {}:{}", key, chrom, pos)),
        Some(Some(value)) => anyhow::bail!(
            "INFO/{} in record {}:{} has unexpected type: {:?}",
            key,
            chrom,
            pos,
            value
        ),
        _ => anyhow::bail!("missing INFO/{} in record {}:{}", key, chrom, pos),
    }
}

/// Extract an integer INFO list, also accepting a plain integer as a one-element list.
fn info_integers(
    record: &RecordBuf,
    key: &str,
    chrom: &str,
    pos: usize,
) -> Result<Vec<i32>, anyhow::Error> {
    match record.info().get(key) {
        Some(Some(Value::Integer(value))) => Ok(vec![*value]),
        Some(Some(Value::Array(Array::Integer(values)))) => values
            .iter()
            .map(|value| {
                value.ok_or_else(|| {
                    anyhow::anyhow!("empty INFO/{} value in record {}:{}", key, chrom, pos)
                })
            })
            .collect(),
        Some(Some(value)) => anyhow::bail!(
            "INFO/{} in record {}:{} has unexpected type: {:?}",
            key,
            chrom,
            pos,
            value
        ),
        _ => anyhow::bail!("missing INFO/{} in record {}:{}", key, chrom, pos),
    }
}

/// Extract a string INFO list, also accepting a plain string as a one-element list.
fn info_strings(
    record: &RecordBuf,
    key: &str,
    chrom: &str,
    pos: usize,
) -> Result<Vec<String>, anyhow::Error> {
    match record.info().get(key) {
        Some(Some(Value::String(value))) => Ok(vec![value.clone()]),
        Some(Some(Value::Array(Array::String(values)))) => values
            .iter()
            .map(|value| {
                value.clone().ok_or_else(|| {
                    anyhow::anyhow!("empty INFO/{} value in record {}:{}", key, chrom, pos)
                })
            })
            .collect(),
        Some(Some(value)) => anyhow::bail!(
            "INFO/{} in record {}:{} has unexpected type: {:?}",
            key,
            chrom,
            pos,
            value
        ),
        _ => anyhow::bail!("missing INFO/{} in record {}:{}", key, chrom, pos),
    }
}
