use clap::Parser;

use crate::cartography::Tag;

#[derive(Parser, Debug)]
#[command(name = "arcmap")]
#[command(version)]
#[command(about = "Selective, queryable maps of ZIP archive contents", long_about = None)]
#[command(after_help = "Examples:\n  \
  arcmap data.zip -l                      list entry names\n  \
  arcmap data.zip -v -f 'dir/.*'          verbose listing of one subtree\n  \
  arcmap app.jar -m                       show the manifest attribute blocks\n  \
  arcmap data.zip -d out -o               extract everything into out/, overwriting")]
pub struct Cli {
    /// ZIP archive path
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Entry-name filter (whole-name regular expression)
    #[arg(short = 'f', long = "filter", value_name = "PATTERN")]
    pub filter: Option<String>,

    /// Information tags to collect (e.g. basic-info, checksum, full)
    #[arg(short = 'i', long = "info", value_name = "TAG", value_parser = parse_tag)]
    pub info: Vec<Tag>,

    /// Read the archive manifest and print its attribute blocks
    #[arg(short = 'm', long = "manifest")]
    pub manifest: bool,

    /// List entry names (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely with sizes, ratio and timestamps
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract matching entries into DIR
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }
}

fn parse_tag(value: &str) -> Result<Tag, String> {
    value.parse().map_err(|e| format!("{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_documented_tag_name_parses() {
        for name in [
            "name",
            "path",
            "size",
            "compressed-size",
            "comment",
            "checksum",
            "extra",
            "compression-method",
            "time",
            "manifest-attributes",
            "certificates",
            "code-signers",
            "content",
            "include-directories",
            "default",
            "file-info",
            "file",
            "basic-info",
            "compression-info",
            "full-info",
            "full",
        ] {
            assert!(parse_tag(name).is_ok(), "tag '{name}' failed to parse");
        }
    }
}
