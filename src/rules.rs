//! Rules files: one `<path> [options]` request per line.
//!
//! Blank lines and lines starting with `#` are ignored. Every line is
//! validated before anything runs, and all failures are reported together.
//!
//! A file runs either entirely dry or entirely live. Lines may carry `-n`
//! only if every line does; otherwise pass `--dry` for the whole file.

use anyhow::{Context, Result, bail};
use clap::Parser;
use rightskit::ChangeRequest;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{AttributeArgs, RuleLine};

/// Read and validate a rules file.
pub fn load(path: &Path, defaults: &AttributeArgs) -> Result<Vec<ChangeRequest>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read rules file {}", path.display()))?;
    let requests = parse(&content, defaults)
        .with_context(|| format!("Invalid rules file {}", path.display()))?;
    if requests.is_empty() {
        bail!("No rules found in {}", path.display());
    }
    Ok(requests)
}

/// Parse rules text. `defaults` supplies `--dry` and `--mask` for lines
/// that do not set them.
pub fn parse(content: &str, defaults: &AttributeArgs) -> Result<Vec<ChangeRequest>> {
    let mut requests = Vec::new();
    let mut problems = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_line(line, defaults) {
            Ok(request) => requests.push((index + 1, request)),
            Err(err) => problems.push(format!("line {}: {err}", index + 1)),
        }
    }

    if !problems.is_empty() {
        bail!(problems.join("\n"));
    }

    let dry_lines: Vec<String> = requests
        .iter()
        .filter(|(_, request)| request.is_dry_run())
        .map(|(number, _)| number.to_string())
        .collect();
    if !dry_lines.is_empty() && dry_lines.len() < requests.len() {
        bail!(
            "dry-run lines {} are mixed with live lines; use --dry for the whole file",
            dry_lines.join(", ")
        );
    }
    Ok(requests.into_iter().map(|(_, request)| request).collect())
}

fn parse_line(line: &str, defaults: &AttributeArgs) -> Result<ChangeRequest> {
    let rule = RuleLine::try_parse_from(line.split_whitespace()).map_err(|err| {
        // clap renders usage and hints after the first line
        let rendered = err.to_string();
        let first = rendered.lines().next().unwrap_or_default();
        anyhow::anyhow!(first.trim_start_matches("error: ").to_string())
    })?;

    let root = PathBuf::from(shellexpand::tilde(&rule.path).as_ref());
    let mut options = rule.attrs.into_options();
    options.dry_run |= defaults.dry;
    if options.mask.is_none() {
        options.mask.clone_from(&defaults.mask);
    }

    Ok(ChangeRequest::new(root, options)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn defaults() -> AttributeArgs {
        AttributeArgs::default()
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let tmp = TempDir::new().unwrap();
        let text = format!(
            "# shared area\n\n{root} -m 2775 --mask 0664\n   \n{root} --group 0 --maxdepth 1\n",
            root = tmp.path().display()
        );
        let requests = parse(&text, &defaults()).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].dir_mode().unwrap().bits(), 0o2775);
        assert_eq!(requests[0].file_mode().unwrap().bits(), 0o664);
        assert_eq!(requests[1].group().unwrap().id(), 0);
        assert_eq!(requests[1].max_depth(), Some(1));
        assert!(!requests[0].is_dry_run());
    }

    #[test]
    fn test_defaults_apply_to_lines_without_their_own() {
        let tmp = TempDir::new().unwrap();
        let text = format!(
            "{root} -m 755\n{root} -m 755 --mask 0600\n",
            root = tmp.path().display()
        );
        let defaults = AttributeArgs {
            dry: true,
            mask: Some("0640".into()),
            ..AttributeArgs::default()
        };
        let requests = parse(&text, &defaults).unwrap();
        assert!(requests.iter().all(ChangeRequest::is_dry_run));
        assert_eq!(requests[0].file_mode().unwrap().bits(), 0o640);
        assert_eq!(requests[1].file_mode().unwrap().bits(), 0o600);
    }

    #[test]
    fn test_reports_every_bad_line() {
        let tmp = TempDir::new().unwrap();
        let text = format!(
            "{root} -m abc\n{root} -m 755\n{root}\n{root} --bogus\n",
            root = tmp.path().display()
        );
        let err = parse(&text, &defaults()).unwrap_err().to_string();
        assert!(err.contains("line 1: Mode must be octal."), "{err}");
        assert!(!err.contains("line 2"), "{err}");
        assert!(
            err.contains("line 3: Please specify at least one of owner, group and/or mode."),
            "{err}"
        );
        assert!(err.contains("line 4: "), "{err}");
    }

    #[test]
    fn test_rejects_mixed_dry_and_live_lines() {
        let tmp = TempDir::new().unwrap();
        let text = format!(
            "{root} -m 755\n{root} -m 700 -n\n{root} -m 750\n",
            root = tmp.path().display()
        );
        let err = parse(&text, &defaults()).unwrap_err().to_string();
        assert!(err.starts_with("dry-run lines 2 are mixed"), "{err}");

        let all_dry = format!(
            "{root} -m 755 -n\n{root} -m 700 --dry\n",
            root = tmp.path().display()
        );
        let requests = parse(&all_dry, &defaults()).unwrap();
        assert!(requests.iter().all(ChangeRequest::is_dry_run));

        let global = AttributeArgs {
            dry: true,
            ..AttributeArgs::default()
        };
        assert_eq!(parse(&text, &global).unwrap().len(), 3);
    }

    #[test]
    fn test_tilde_expands_to_home() {
        let err = parse("~/surely-missing-rights-dir -m 755\n", &defaults())
            .unwrap_err()
            .to_string();
        assert!(!err.contains("'~"), "{err}");
        assert!(err.contains("surely-missing-rights-dir"), "{err}");
    }

    #[test]
    fn test_load_rejects_empty_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("rules");
        fs::write(&file, "# nothing yet\n").unwrap();
        let err = load(&file, &defaults()).unwrap_err();
        assert!(err.to_string().starts_with("No rules found"));

        let err = load(&tmp.path().join("missing"), &defaults()).unwrap_err();
        assert!(err.to_string().starts_with("Could not read rules file"));
    }
}
