use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chunkdiff_core::{align_hunks, parse_hunks, Chunker, ChunkerConfig, Diff, Hunk, HunkKind};
use colored::Colorize;
use serde::Serialize;

use crate::cli::*;
use crate::render;
use crate::settings::chunker_config;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match cli.command {
        Command::Diff(args) => cmd_diff(args, cli.format, &mut out),
        Command::Chunks(args) => cmd_chunks(args, cli.format, &mut out),
        Command::Align(args) => cmd_align(args, cli.format, &mut out),
    }
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn kind_of(hunk: &Hunk) -> HunkKind {
    match (hunk.a.is_empty(), hunk.b.is_empty()) {
        (false, true) => HunkKind::OnlyInA,
        (true, false) => HunkKind::OnlyInB,
        _ => HunkKind::Change,
    }
}

#[derive(Serialize)]
struct DiffReport<'p> {
    a: &'p Path,
    b: &'p Path,
    a_len: usize,
    b_len: usize,
    config: ChunkerConfig,
    precise: bool,
    hunks: Vec<HunkRecord>,
}

#[derive(Serialize)]
struct HunkRecord {
    kind: HunkKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    virtual_start: Option<usize>,
    a: Range<usize>,
    b: Range<usize>,
}

fn diff_records(diff: &Diff<'_>, precise: bool) -> Vec<HunkRecord> {
    if precise {
        diff.narrowed_hunks()
            .into_iter()
            .map(|hunk| HunkRecord {
                kind: kind_of(&hunk),
                virtual_start: None,
                a: hunk.a,
                b: hunk.b,
            })
            .collect()
    } else {
        diff.iter()
            .map(|hunk| {
                let source = hunk.to_hunk();
                HunkRecord {
                    kind: hunk.kind(),
                    virtual_start: Some(hunk.start()),
                    a: source.a,
                    b: source.b,
                }
            })
            .collect()
    }
}

fn cmd_diff(args: DiffArgs, format: OutputFormat, out: &mut impl Write) -> anyhow::Result<()> {
    let config = chunker_config(&args.chunking)?;
    let a = read_file(&args.a)?;
    let b = read_file(&args.b)?;
    let diff = Diff::with_config(&a, &b, config)?;
    let records = diff_records(&diff, args.precise);
    tracing::debug!(hunks = records.len(), precise = args.precise, "diff complete");

    match format {
        OutputFormat::Hunks => {
            for record in &records {
                writeln!(out, "{}", Hunk { a: record.a.clone(), b: record.b.clone() })?;
            }
        }
        OutputFormat::Json => {
            let report = DiffReport {
                a: &args.a,
                b: &args.b,
                a_len: a.len(),
                b_len: b.len(),
                config,
                precise: args.precise,
                hunks: records,
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        OutputFormat::Text => write_diff_text(out, &args, a.len(), b.len(), &records)?,
    }
    Ok(())
}

fn write_diff_text(
    out: &mut impl Write,
    args: &DiffArgs,
    a_len: usize,
    b_len: usize,
    records: &[HunkRecord],
) -> anyhow::Result<()> {
    if records.is_empty() {
        writeln!(out, "{} No differences.", "✓".green().bold())?;
        return Ok(());
    }

    let a_ranges: Vec<Range<usize>> = records.iter().map(|r| r.a.clone()).collect();
    let b_ranges: Vec<Range<usize>> = records.iter().map(|r| r.b.clone()).collect();
    writeln!(
        out,
        "{} {} ({})",
        "a:".red().bold(),
        args.a.display(),
        render::bytes(a_len)
    )?;
    writeln!(out, "   [{}]", render::bar(a_len, &a_ranges, args.width).red())?;
    writeln!(
        out,
        "{} {} ({})",
        "b:".green().bold(),
        args.b.display(),
        render::bytes(b_len)
    )?;
    writeln!(out, "   [{}]", render::bar(b_len, &b_ranges, args.width).green())?;
    writeln!(out)?;

    for record in records {
        let position = match record.virtual_start {
            Some(start) => format!("@{start:<10}"),
            None => String::new(),
        };
        let label = record.kind.to_string();
        let kind = match record.kind {
            HunkKind::OnlyInA => label.red(),
            HunkKind::OnlyInB => label.green(),
            HunkKind::Change => label.yellow(),
        };
        writeln!(
            out,
            "  {:<7} {}a[{}..{}] ({})  b[{}..{}] ({})",
            kind,
            position.dimmed(),
            record.a.start,
            record.a.end,
            render::bytes(record.a.len()),
            record.b.start,
            record.b.end,
            render::bytes(record.b.len()),
        )?;
    }

    let only_a: usize = records.iter().map(|r| r.a.len()).sum();
    let only_b: usize = records.iter().map(|r| r.b.len()).sum();
    writeln!(
        out,
        "\n{} hunks, {} from a, {} from b",
        records.len().to_string().bold(),
        render::bytes(only_a).red(),
        render::bytes(only_b).green()
    )?;
    Ok(())
}

#[derive(Serialize)]
struct ChunkRecord {
    id: usize,
    start: usize,
    end: usize,
    len: usize,
    digest: String,
}

fn cmd_chunks(args: ChunksArgs, format: OutputFormat, out: &mut impl Write) -> anyhow::Result<()> {
    let config = chunker_config(&args.chunking)?;
    let data = read_file(&args.file)?;
    let chain = Chunker::new(config)?.split(&data);

    match format {
        OutputFormat::Hunks => anyhow::bail!("--format hunks applies to diff and align only"),
        OutputFormat::Json => {
            let records: Vec<ChunkRecord> = chain
                .iter()
                .map(|chunk| ChunkRecord {
                    id: chunk.id(),
                    start: chunk.start(),
                    end: chunk.end(),
                    len: chunk.len(),
                    digest: chunk.digest().to_hex(),
                })
                .collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&records)?)?;
        }
        OutputFormat::Text => {
            for chunk in &chain {
                writeln!(
                    out,
                    "{:>6} {:>10}..{:<10} {:>8}  {}",
                    chunk.id(),
                    chunk.start(),
                    chunk.end(),
                    chunk.len(),
                    chunk.digest().short_hex().dimmed()
                )?;
            }
            let average = data.len() / chain.len().max(1);
            writeln!(
                out,
                "\n{} chunks over {}, average {} (target {})",
                chain.len().to_string().bold(),
                render::bytes(data.len()),
                render::bytes(average),
                render::bytes(config.target_chunk_size())
            )?;
        }
    }
    Ok(())
}

fn open_input(input: Option<&PathBuf>) -> anyhow::Result<Box<dyn BufRead>> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

fn cmd_align(args: AlignArgs, format: OutputFormat, out: &mut impl Write) -> anyhow::Result<()> {
    let reader = open_input(args.input.as_ref())?;
    let hunks = parse_hunks(reader).context("parsing hunk stream")?;
    let alignment = align_hunks(&hunks);
    tracing::debug!(
        hunks = alignment.hunks.len(),
        offset_a = alignment.offset_a,
        offset_b = alignment.offset_b,
        "aligned hunks"
    );

    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&alignment)?)?,
        OutputFormat::Hunks => {
            for hunk in &alignment.hunks {
                writeln!(out, "{hunk}")?;
            }
        }
        OutputFormat::Text => {
            for hunk in &alignment.hunks {
                writeln!(out, "{hunk}")?;
            }
            writeln!(
                out,
                "{} offset a = {}, offset b = {}",
                "✓".green().bold(),
                alignment.offset_a.to_string().yellow(),
                alignment.offset_b.to_string().yellow()
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ChunkingArgs;

    fn output(run: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        run(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn write(dir: &tempfile::TempDir, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    fn diff_args(a: PathBuf, b: PathBuf, precise: bool) -> DiffArgs {
        DiffArgs {
            a,
            b,
            chunking: ChunkingArgs::default(),
            precise,
            width: 20,
        }
    }

    fn ones_around_a_zero(dir: &tempfile::TempDir) -> (PathBuf, PathBuf) {
        let mut a = vec![1u8; 15];
        a.push(0);
        a.extend([1u8; 15]);
        (write(dir, "a.bin", &a), write(dir, "b.bin", &[1u8; 30]))
    }

    #[test]
    fn identical_files_report_no_differences() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.bin", b"same content");
        let b = write(&dir, "b.bin", b"same content");
        let text = output(|out| cmd_diff(diff_args(a, b, false), OutputFormat::Text, out));
        assert!(text.contains("No differences."));
    }

    #[test]
    fn hunks_format_prints_source_lines() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = ones_around_a_zero(&dir);
        let text = output(|out| cmd_diff(diff_args(a, b, false), OutputFormat::Hunks, out));
        assert_eq!(text, "0 31 0 30\n");
    }

    #[test]
    fn precise_hunks_are_narrowed() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = ones_around_a_zero(&dir);
        let text = output(|out| cmd_diff(diff_args(a, b, true), OutputFormat::Hunks, out));
        assert_eq!(text, "15 16 15 15\n");
    }

    #[test]
    fn json_report_lists_hunks() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = ones_around_a_zero(&dir);
        let text = output(|out| cmd_diff(diff_args(a, b, false), OutputFormat::Json, out));
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["a_len"], 31);
        assert_eq!(json["b_len"], 30);
        assert_eq!(json["config"]["window_size"], 8);
        assert_eq!(json["hunks"][0]["kind"], "change");
        assert_eq!(json["hunks"][0]["virtual_start"], 0);
        assert_eq!(json["hunks"][0]["a"]["end"], 31);
    }

    #[test]
    fn precise_json_kinds_follow_narrowed_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = ones_around_a_zero(&dir);
        let text = output(|out| cmd_diff(diff_args(a, b, true), OutputFormat::Json, out));
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["hunks"][0]["kind"], "only-a");
        assert!(json["hunks"][0].get("virtual_start").is_none());
        assert_eq!(json["config"]["sample_size"], 1);
    }

    #[test]
    fn text_report_draws_bars() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = ones_around_a_zero(&dir);
        let text = output(|out| cmd_diff(diff_args(a, b, true), OutputFormat::Text, out));
        assert!(text.contains("a: "));
        assert!(text.contains(&format!("[{}]", ".".repeat(9) + "#" + &".".repeat(10))));
        assert!(text.contains("only-a"));
        assert!(text.contains("1 hunks"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("nope.bin");
        let b = write(&dir, "b.bin", b"x");
        let mut out = Vec::new();
        let err = cmd_diff(diff_args(a, b, false), OutputFormat::Text, &mut out).unwrap_err();
        assert!(err.to_string().contains("nope.bin"));
    }

    #[test]
    fn chunks_json_covers_file() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..4_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8).collect();
        let file = write(&dir, "data.bin", &data);
        let args = ChunksArgs {
            file,
            chunking: ChunkingArgs::default(),
        };
        let text = output(|out| cmd_chunks(args, OutputFormat::Json, out));
        let chunks: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert!(!chunks.is_empty());
        assert_eq!(chunks[0]["start"], 0);
        assert_eq!(chunks.last().unwrap()["end"], 4_000);
        assert_eq!(chunks[0]["digest"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn chunks_reject_hunks_format() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "data.bin", b"abc");
        let args = ChunksArgs {
            file,
            chunking: ChunkingArgs::default(),
        };
        let mut out = Vec::new();
        assert!(cmd_chunks(args, OutputFormat::Hunks, &mut out).is_err());
    }

    #[test]
    fn align_reproduces_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(
            &dir,
            "hunks.txt",
            b"0 0 0 1000\n2000 5000 3000 7000\n6000 7000 8000 8000\n",
        );
        let args = AlignArgs { input: Some(input) };
        let text = output(|out| cmd_align(args, OutputFormat::Text, out));
        assert_eq!(
            text,
            "0 0 0 1000\n3000 6000 3000 7000\n11000 12000 11000 11000\n\
             ✓ offset a = 4000, offset b = 5000\n"
        );
    }

    #[test]
    fn align_reports_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(&dir, "hunks.txt", b"0 0 0 1\n1 2\n");
        let args = AlignArgs { input: Some(input) };
        let mut out = Vec::new();
        let err = cmd_align(args, OutputFormat::Hunks, &mut out).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn hunk_kinds_from_ranges() {
        assert_eq!(kind_of(&Hunk::new(0, 4, 0, 0)), HunkKind::OnlyInA);
        assert_eq!(kind_of(&Hunk::new(0, 0, 0, 4)), HunkKind::OnlyInB);
        assert_eq!(kind_of(&Hunk::new(0, 1, 0, 4)), HunkKind::Change);
    }
}
