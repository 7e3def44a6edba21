//! Invocation of Ensembl VEP and parsing of its tabular output.
//!
//! VEP is run with `--most_severe --variant_class`, so each data line of its
//! output carries the site key in the `Uploaded_variation` column, the most
//! severe consequence in the `Consequence` column, and a `VARIANT_CLASS=...`
//! entry in the `Extra` column.

use std::collections::HashMap;
use std::io::BufRead;
use std::process::Command;

use thousands::Separable;

use crate::common::io::open_read_maybe_gz;
use crate::common::GenomeRelease;

/// Column index of the most severe consequence.
const CONSEQUENCE_COL: usize = 6;
/// Column index of the `Extra` column carrying `VARIANT_CLASS=`.
const VARIANT_CLASS_COL: usize = 13;

/// Consequence information of one input site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsequenceInfo {
    /// Class of the variant, e.g. `SNV`.
    pub variant_class: String,
    /// Most severe consequence of the variant, e.g. `missense_variant`.
    pub consequence: String,
}

/// Mapping from site key (`Uploaded_variation` column) to consequence information.
pub type ConsequenceMap = HashMap<String, ConsequenceInfo>;

/// Configuration for constructing the `VepRunner`.
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(pattern = "immutable")]
pub struct Config {
    /// Name of the VEP executable to invoke.
    #[builder(default = "String::from(\"vep\")")]
    pub command: String,
    /// Path of the intermediate output file written by VEP and parsed back.
    #[builder(default = "String::from(\"vep_output.txt\")")]
    pub path_output: String,
    /// Genome release passed to VEP via `--assembly`.
    #[builder(default)]
    pub genome_release: GenomeRelease,
}

/// Runner for VEP that converts the resulting table into a `ConsequenceMap`.
#[derive(Debug)]
pub struct VepRunner {
    /// Configuration of the runner.
    config: Config,
}

impl VepRunner {
    /// Construct with the given configuration.  Does not invoke anything yet.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run VEP on `path_input_vcf` and parse the resulting table.
    pub fn build_consequence_map(
        &self,
        path_input_vcf: &str,
    ) -> Result<ConsequenceMap, anyhow::Error> {
        self.run_vep(path_input_vcf)?;

        let reader = open_read_maybe_gz(&self.config.path_output).map_err(|e| {
            anyhow::anyhow!("could not open {}: {}", &self.config.path_output, e)
        })?;
        let result = parse_vep_output(reader).map_err(|e| {
            anyhow::anyhow!("problem parsing {}: {}", &self.config.path_output, e)
        })?;
        tracing::info!(
            "parsed {} consequence entries from {}",
            result.len().separate_with_commas(),
            &self.config.path_output
        );

        Ok(result)
    }

    /// Invoke the VEP subprocess, blocking until it exits.  Stdio is inherited so
    /// VEP's own progress output remains visible.
    fn run_vep(&self, path_input_vcf: &str) -> Result<(), anyhow::Error> {
        let assembly = self.config.genome_release.name();
        let args = [
            "--cache",
            "-i",
            path_input_vcf,
            "-o",
            &self.config.path_output,
            "--assembly",
            &assembly,
            "--variant_class",
            "--most_severe",
            "--force_overwrite",
        ];

        tracing::info!("running {} {}", &self.config.command, args.join(" "));
        let status = Command::new(&self.config.command)
            .args(args)
            .status()
            .map_err(|e| anyhow::anyhow!("could not launch {}: {}", &self.config.command, e))?;
        if !status.success() {
            anyhow::bail!("{} exited with {}", &self.config.command, status);
        }

        Ok(())
    }
}

/// Parse VEP tabular output into a `ConsequenceMap`.
///
/// Comment lines (`#` prefix) are skipped; all other lines are tokenized on
/// whitespace.  When the same site key occurs on multiple lines, the last one
/// wins.
pub fn parse_vep_output<R: BufRead>(reader: R) -> Result<ConsequenceMap, anyhow::Error> {
    let mut result = ConsequenceMap::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.starts_with('#') {
            continue;
        }

        let fields = line.split_whitespace().collect::<Vec<_>>();
        if fields.len() <= VARIANT_CLASS_COL {
            anyhow::bail!(
                "line {}: expected at least {} columns, found {}",
                i + 1,
                VARIANT_CLASS_COL + 1,
                fields.len()
            );
        }
        let variant_class = fields[VARIANT_CLASS_COL]
            .split('=')
            .nth(1)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "line {}: expected key=value in column {}, found {:?}",
                    i + 1,
                    VARIANT_CLASS_COL,
                    fields[VARIANT_CLASS_COL]
                )
            })?;

        result.insert(
            fields[0].to_string(),
            ConsequenceInfo {
                variant_class: variant_class.to_string(),
                consequence: fields[CONSEQUENCE_COL].to_string(),
            },
        );
    }

    Ok(result)
}
