//! Computation of the per-site output row.

use itertools::Itertools;

use super::exac::{AlleleFrequency, AlleleFrequencyClient};
use super::vcf::VariantRecord;
use super::vep::ConsequenceMap;

/// Header of the output table.
pub const HEADER: &str = "chrom\tposition\tref\talt\tseq_depth_at_site\tnum_var_alleles\t\
     perc_var_versus_ref_alleles\tvariant_class\tconsequence\texac_af";

/// One row of the output table.
#[derive(Debug, Clone)]
pub struct SiteMetrics {
    /// Chromosome name.
    pub chrom: String,
    /// 1-based position.
    pub position: usize,
    /// Reference allele.
    pub reference: String,
    /// Alternate alleles, in input order.
    pub alternate: Vec<String>,
    /// Total read depth at the site.
    pub seq_depth_at_site: i32,
    /// Total number of reads supporting any alternate allele.
    pub num_var_alleles: i32,
    /// Percentage of reads supporting an alternate allele versus all
    /// allele-supporting reads.  NaN when no read supports any allele.
    pub perc_alt: f64,
    /// Percentage of reads supporting the reference allele.
    pub perc_ref: f64,
    /// Variant class of the site, or the fallback label when the predictor
    /// reported nothing for it.
    pub variant_class: String,
    /// Most severe consequence, or `unknown`.
    pub consequence: String,
    /// Allele frequency per alternate allele, in input order.
    pub exac_af: Vec<AlleleFrequency>,
}

impl std::fmt::Display for SiteMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}:{}\t{}\t{}\t{}",
            self.chrom,
            self.position,
            self.reference,
            self.alternate.iter().join(","),
            self.seq_depth_at_site,
            self.num_var_alleles,
            self.perc_alt,
            self.perc_ref,
            self.variant_class,
            self.consequence,
            self.exac_af.iter().join(","),
        )
    }
}

/// Assemble the output row for one record.
///
/// Consequence information is looked up by the record's site key; for sites
/// the predictor reported nothing for, the variant class falls back to
/// `no_VEP_output:` plus the record's `TYPE` labels and the consequence to
/// `unknown`.  The allele frequency is fetched once per alternate allele.
pub fn extract_metrics(
    record: &VariantRecord,
    consequences: &ConsequenceMap,
    client: &AlleleFrequencyClient,
) -> Result<SiteMetrics, anyhow::Error> {
    let num_var_alleles: i32 = record.alt_observations.iter().sum();
    let allele_total = (num_var_alleles + record.ref_observations) as f64;
    // NaN when neither allele has observations; written out as-is.
    let perc_alt = 100.0 * num_var_alleles as f64 / allele_total;
    let perc_ref = 100.0 * record.ref_observations as f64 / allele_total;

    let (variant_class, consequence) = match consequences.get(&record.site_key()) {
        Some(info) => (info.variant_class.clone(), info.consequence.clone()),
        None => (
            format!("no_VEP_output:{}", record.var_types.iter().join(",")),
            String::from("unknown"),
        ),
    };

    let exac_af = record
        .alternate
        .iter()
        .map(|alt| client.lookup(&record.chrom, record.pos, &record.reference, alt))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SiteMetrics {
        chrom: record.chrom.clone(),
        position: record.pos,
        reference: record.reference.clone(),
        alternate: record.alternate.clone(),
        seq_depth_at_site: record.depth,
        num_var_alleles,
        perc_alt,
        perc_ref,
        variant_class,
        consequence,
        exac_af,
    })
}
