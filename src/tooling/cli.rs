//! CLI Tooling
//!
//! Command-line interface for both conversion directions. `generate`
//! materializes a Markdown document into a directory tree; `export` walks a
//! directory and emits the document. Command output goes to stdout, all
//! diagnostics to the logging layer.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::cache::Cache;
use crate::config::Config;
use crate::document::blocks::{map_blocks, MapperOptions};
use crate::document::scan;
use crate::document::structure::extract_structure_block;
use crate::error::Error;
use crate::ignore::IgnoreSet;
use crate::interactive::{ConflictResolver, PromptResolver, SilentResolver};
use crate::materialize::{materialize, MaterializeOptions};
use crate::reconcile::{reconcile, ForceLists};
use crate::report::{
    format_plan_preview, format_report_json, format_report_markdown, format_report_text,
};
use crate::serialize::{serialize_tree, verify_roundtrip, SerializeOptions};
use crate::tree::parser::parse_tree;

/// mdfold - fold directory trees into Markdown and back
#[derive(Parser)]
#[command(name = "mdfold")]
#[command(about = "Bidirectional converter between Markdown documents and directory trees")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides .mdfold.json discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Materialize a Markdown document into a directory tree
    Generate {
        /// Input Markdown file
        input: PathBuf,

        /// Output root directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Report what would happen without writing
        #[arg(long)]
        dry_run: bool,

        /// Print the planned layout and stop before writing
        #[arg(long)]
        preview: bool,

        /// Never overwrite existing files
        #[arg(long)]
        no_overwrite: bool,

        /// Bypass the incremental cache
        #[arg(long)]
        no_cache: bool,

        /// Fail on any issue instead of recovering
        #[arg(long)]
        strict: bool,

        /// Keep consumed inline path hints in file content
        #[arg(long)]
        keep_hints: bool,

        /// Discard blocks with no destination instead of holding them
        #[arg(long)]
        no_unassigned: bool,

        /// Do not write placeholder files for blockless declarations
        #[arg(long)]
        skip_empty: bool,

        /// Mark shebang files executable
        #[arg(long)]
        set_exec: bool,

        /// Treat these names or paths as files when claims conflict
        #[arg(long = "force-file")]
        force_file: Vec<String>,

        /// Treat these names or paths as directories when claims conflict
        #[arg(long = "force-dir")]
        force_dir: Vec<String>,

        /// Never prompt; unresolved conflicts default to directories
        #[arg(long)]
        non_interactive: bool,

        /// Summary format (text, json, markdown)
        #[arg(long, default_value = "text")]
        summary: String,

        /// Also write the JSON summary to this file
        #[arg(long)]
        json_summary: Option<PathBuf>,

        /// List every path outcome in the text summary
        #[arg(long)]
        verbose: bool,
    },
    /// Serialize a directory tree into a Markdown document
    Export {
        /// Source directory
        source: PathBuf,

        /// Output Markdown file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// Extra ignore globs on top of the defaults
        #[arg(long)]
        ignore: Vec<String>,

        /// Re-parse the document and compare against the source
        #[arg(long)]
        verify: bool,

        /// Per-file size limit in bytes
        #[arg(long)]
        max_file_size: Option<u64>,
    },
}

/// Holds resolved configuration, executes commands.
pub struct CliContext {
    config: Config,
}

impl CliContext {
    /// Create a new CLI context. An explicit config path must exist; the
    /// discovered `.mdfold.json` is optional.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, Error> {
        let config = match config_path {
            Some(path) => Config::load(&path)?,
            None => Config::discover(std::path::Path::new("."))?,
        };
        Ok(CliContext { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute a command, returning the text for stdout.
    pub fn execute(&self, command: &Commands) -> Result<String, Error> {
        let started = Instant::now();
        let result = match command {
            Commands::Generate { .. } => self.execute_generate(command),
            Commands::Export { .. } => self.execute_export(command),
        };
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "command finished"
        );
        result
    }

    fn execute_generate(&self, command: &Commands) -> Result<String, Error> {
        let Commands::Generate {
            input,
            output,
            dry_run,
            preview,
            no_overwrite,
            no_cache,
            strict,
            keep_hints,
            no_unassigned,
            skip_empty,
            set_exec,
            force_file,
            force_dir,
            non_interactive,
            summary,
            json_summary,
            verbose,
        } = command
        else {
            return Err(Error::Config("generate handler got wrong command".to_string()));
        };

        let text = std::fs::read_to_string(input)
            .map_err(|_| Error::InputNotFound(input.clone()))?;
        let doc = scan(&text);
        let structure = extract_structure_block(&doc)?;
        let parsed = parse_tree(&structure.text)?;
        let blocks = map_blocks(
            &doc,
            Some(&structure),
            Some(&parsed.tree),
            MapperOptions {
                strip_hints: self.config.strip_hints && !keep_hints,
            },
        );

        let mut forced_files = self.config.force_file.clone();
        forced_files.extend(force_file.iter().cloned());
        let mut forced_dirs = self.config.force_dir.clone();
        forced_dirs.extend(force_dir.iter().cloned());
        let force = ForceLists::new(&forced_files, &forced_dirs);
        let mut prompt = PromptResolver;
        let mut silent = SilentResolver;
        let resolver: &mut dyn ConflictResolver = if *non_interactive {
            &mut silent
        } else {
            &mut prompt
        };
        let mut plan = reconcile(parsed, blocks, &force, resolver);
        plan.issues.extend(doc.issues.iter().cloned());

        if *preview {
            return Ok(format_plan_preview(&plan));
        }

        let opts = MaterializeOptions {
            output_root: output.clone(),
            dry_run: *dry_run,
            no_overwrite: *no_overwrite,
            use_cache: !no_cache,
            write_unassigned: !no_unassigned,
            skip_empty: *skip_empty,
            set_exec: *set_exec,
            strict: *strict,
        };
        let mut cache = (!no_cache).then(|| Cache::load(output));
        let report = materialize(&plan, &self.config, &opts, cache.as_mut())?;

        if let Some(path) = json_summary {
            if !dry_run {
                std::fs::write(path, format_report_json(&report)?)
                    .map_err(|e| Error::io(path, e))?;
            }
        }

        if *strict && report.has_issues() {
            return Err(Error::Strict(format!(
                "{} issue(s), {} unassigned block(s), {} failure(s)",
                report.issues.len(),
                report.unassigned_blocks,
                report.count(crate::report::NodeStatus::Failed),
            )));
        }

        match summary.as_str() {
            "json" => format_report_json(&report),
            "markdown" => Ok(format_report_markdown(&report)),
            _ => Ok(format_report_text(&report, *verbose)),
        }
    }

    fn execute_export(&self, command: &Commands) -> Result<String, Error> {
        let Commands::Export {
            source,
            output,
            title,
            ignore,
            verify,
            max_file_size,
        } = command
        else {
            return Err(Error::Config("export handler got wrong command".to_string()));
        };

        let mut config = self.config.clone();
        if let Some(limit) = max_file_size {
            config.max_file_size = *limit;
        }
        let mut patterns = config.ignore.clone();
        patterns.extend(ignore.iter().cloned());
        let ignore_set = IgnoreSet::build(&patterns)?;

        let mut opts = SerializeOptions::new(source);
        opts.title = title.clone();
        let doc = serialize_tree(&opts, &config, &ignore_set)?;
        for notice in &doc.notices {
            warn!("{}", notice);
        }

        if *verify {
            let mismatches = verify_roundtrip(&doc.markdown, source, &config)?;
            if !mismatches.is_empty() {
                return Err(Error::Strict(format!(
                    "round-trip verification failed for: {}",
                    mismatches.join(", ")
                )));
            }
            info!(files = doc.file_count, "round-trip verified");
        }

        match output {
            Some(path) => {
                std::fs::write(path, &doc.markdown).map_err(|e| Error::io(path, e))?;
                Ok(format!(
                    "Wrote {} file(s) to {}",
                    doc.file_count,
                    path.display()
                ))
            }
            None => Ok(doc.markdown.clone()),
        }
    }
}
