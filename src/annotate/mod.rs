//! Annotation of VCF files with read depth metrics, predicted consequences,
//! and population allele frequencies.

pub mod exac;
pub mod metrics;
pub mod vcf;
pub mod vep;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

use clap::Parser;
use thousands::Separable;

use crate::common::trace_rss_now;

use self::exac::AlleleFrequencyClient;
use self::metrics::extract_metrics;
use self::vcf::{open_vcf_reader, VariantRecord};
use self::vep::{ConsequenceMap, VepRunner};

/// Command line arguments for the annotation.
#[derive(Parser, Debug)]
#[command(
    about = "Annotate VCF files with depth metrics, consequences, and allele frequencies",
    long_about = None
)]
pub struct Args {
    /// Path to the input VCF file.
    #[arg(short = 'i', long = "input_vcf")]
    pub path_input_vcf: String,
    /// Path to the output metrics TSV file.
    #[arg(short = 'o', long = "output_metrics")]
    pub path_output_metrics: String,
}

/// Run the annotation with the given `Write`.
fn run_with_writer<Inner: Write>(
    mut writer: Inner,
    consequences: &ConsequenceMap,
    client: &AlleleFrequencyClient,
    args: &Args,
) -> Result<(), anyhow::Error> {
    tracing::info!("Open VCF and read header");
    let mut reader = open_vcf_reader(&args.path_input_vcf)?;
    let header = reader.read_header()?;

    tracing::info!("Annotating VCF ...");
    let start = Instant::now();
    let mut total_written = 0usize;

    writeln!(writer, "{}", metrics::HEADER)?;
    for record in reader.record_bufs(&header) {
        let record = VariantRecord::from_record_buf(&record?)?;
        let row = extract_metrics(&record, consequences, client)?;
        writeln!(writer, "{}", &row)?;

        total_written += 1;
    }
    writer.flush()?;

    tracing::info!(
        "... annotated {} records in {:?}",
        total_written.separate_with_commas(),
        start.elapsed()
    );
    Ok(())
}

/// Run the annotation with the given VEP and frequency service configuration.
fn run_with_config(
    _common: &crate::common::Args,
    args: &Args,
    vep_config: vep::Config,
    exac_config: exac::Config,
) -> Result<(), anyhow::Error> {
    tracing::info!(
        "varanno {} annotating {}",
        crate::common::version(),
        &args.path_input_vcf
    );

    let runner = VepRunner::new(vep_config);
    let consequences = runner.build_consequence_map(&args.path_input_vcf)?;
    trace_rss_now();

    let client = AlleleFrequencyClient::new(exac_config);
    let writer = File::create(&args.path_output_metrics).map(BufWriter::new)?;
    run_with_writer(writer, &consequences, &client, args)?;

    Ok(())
}

/// Main entry point for the annotation.
pub fn run(common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    run_with_config(
        common,
        args,
        vep::ConfigBuilder::default().build()?,
        exac::ConfigBuilder::default().build()?,
    )
}
