//! Word rendering of the Markdown report with every chart embedded.
//!
//! Only the Markdown subset the report itself produces is understood:
//! headings, bullet and numbered lines, pipe tables, image lines, italic
//! captions and `**bold**` spans.

use docx_rs::{AlignmentType, Docx, Paragraph, Pic, Run, Table, TableCell, TableRow};
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::error::{PipelineError, Result};

pub const WORD_FILE: &str = "report.docx";

const EMU_PER_INCH: f64 = 914_400.0;
/// Embedded charts are scaled to this width to fit an A4 page.
const IMAGE_WIDTH_IN: f64 = 6.3;
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Writes `markdown` as a Word document at `path` and returns the number of
/// embedded images.
///
/// Image paths are resolved against `base_dir`.
///
/// # Errors
///
/// Returns [`PipelineError::Rendering`] if a referenced image is missing or
/// not a PNG, or if the document cannot be written.
pub fn write_word_report(markdown: &str, base_dir: &Path, path: &Path) -> Result<usize> {
    let mut docx = Docx::new();
    let mut table: Vec<Vec<String>> = Vec::new();
    let mut images = 0;

    for line in markdown.lines().map(str::trim_end) {
        if let Some(cells) = table_cells(line) {
            if !is_alignment_row(&cells) {
                table.push(cells);
            }
            continue;
        }
        if !table.is_empty() {
            docx = docx.add_table(build_table(&std::mem::take(&mut table)));
        }

        if line.is_empty() || line == "---" {
            continue;
        }
        if let Some((level, text)) = heading(line) {
            docx = docx.add_paragraph(heading_paragraph(level, text));
        } else if let Some(image) = image_path(line) {
            let pic = picture(&base_dir.join(image))?;
            docx = docx.add_paragraph(
                Paragraph::new()
                    .align(AlignmentType::Center)
                    .add_run(Run::new().add_image(pic)),
            );
            images += 1;
        } else if let Some(caption) = caption(line) {
            docx = docx.add_paragraph(
                Paragraph::new()
                    .align(AlignmentType::Center)
                    .add_run(Run::new().add_text(caption).italic().size(18)),
            );
        } else {
            docx = docx.add_paragraph(text_paragraph(&list_item(line)));
        }
    }
    if !table.is_empty() {
        docx = docx.add_table(build_table(&table));
    }

    let file = File::create(path).map_err(|e| PipelineError::rendering(WORD_FILE, e))?;
    docx.build()
        .pack(file)
        .map_err(|e| PipelineError::rendering(WORD_FILE, e))?;

    debug!(path = %path.display(), images, "Word report written");
    Ok(images)
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    let text = line.get(level..)?.strip_prefix(' ')?;
    (1..=4).contains(&level).then_some((level, text))
}

fn heading_paragraph(level: usize, text: &str) -> Paragraph {
    let size = match level {
        1 => 36,
        2 => 30,
        3 => 26,
        _ => 23,
    };
    Paragraph::new().add_run(Run::new().add_text(strip_markup(text)).bold().size(size))
}

/// Target of a `![alt](path)` line.
fn image_path(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("![")?.strip_suffix(')')?;
    let (_, target) = rest.split_once("](")?;
    Some(target)
}

/// Text of a `*caption*` line; `**bold**` lines are not captions.
fn caption(line: &str) -> Option<&str> {
    if line.starts_with("**") {
        return None;
    }
    let text = line.strip_prefix('*')?.strip_suffix('*')?;
    (!text.is_empty()).then_some(text)
}

/// Replaces a leading `- ` bullet with a bullet glyph, keeping the indent.
fn list_item(line: &str) -> String {
    let text = line.trim_start();
    let indent = "    ".repeat((line.len() - text.len()) / 2);
    match text.strip_prefix("- ") {
        Some(item) => format!("{indent}\u{2022} {item}"),
        None => format!("{indent}{text}"),
    }
}

/// Paragraph whose `**…**` spans are bold.
fn text_paragraph(text: &str) -> Paragraph {
    strip_links(text)
        .split("**")
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .fold(Paragraph::new(), |p, (i, part)| {
            let run = Run::new().add_text(part).size(21);
            p.add_run(if i % 2 == 1 { run.bold() } else { run })
        })
}

/// `[text](target)` → `text`.
fn strip_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        let Some((label, after)) = rest[open + 1..].split_once("](") else {
            break;
        };
        let Some(close) = after.find(')') else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push_str(label);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

fn strip_markup(text: &str) -> String {
    strip_links(text).replace("**", "")
}

fn table_cells(line: &str) -> Option<Vec<String>> {
    let inner = line.strip_prefix('|')?.strip_suffix('|')?;
    Some(inner.split('|').map(|c| strip_markup(c.trim())).collect())
}

fn is_alignment_row(cells: &[String]) -> bool {
    cells
        .iter()
        .all(|c| !c.is_empty() && c.chars().all(|ch| ch == '-' || ch == ':'))
}

fn build_table(rows: &[Vec<String>]) -> Table {
    Table::new(
        rows.iter()
            .enumerate()
            .map(|(r, cells)| {
                TableRow::new(
                    cells
                        .iter()
                        .map(|cell| {
                            let run = Run::new().add_text(cell).size(16);
                            let run = if r == 0 { run.bold() } else { run };
                            TableCell::new().add_paragraph(Paragraph::new().add_run(run))
                        })
                        .collect(),
                )
            })
            .collect(),
    )
}

/// Loads a PNG and scales it to the page width, keeping its aspect ratio.
fn picture(path: &Path) -> Result<Pic> {
    let bytes = std::fs::read(path)
        .map_err(|e| PipelineError::rendering(WORD_FILE, format!("{}: {}", path.display(), e)))?;
    let (width, height) = png_dimensions(&bytes).ok_or_else(|| {
        PipelineError::rendering(WORD_FILE, format!("{} is not a PNG image", path.display()))
    })?;

    let width_emu = IMAGE_WIDTH_IN * EMU_PER_INCH;
    let height_emu = width_emu * height as f64 / width as f64;
    Ok(Pic::new(&bytes).size(width_emu.round() as u32, height_emu.round() as u32))
}

/// Width and height from the IHDR chunk.
fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if !bytes.starts_with(PNG_SIGNATURE) {
        return None;
    }
    let width = u32::from_be_bytes(bytes.get(16..20)?.try_into().ok()?);
    let height = u32::from_be_bytes(bytes.get(20..24)?.try_into().ok()?);
    (width > 0 && height > 0).then_some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::surface::with_surface;
    use plotters::prelude::*;
    use std::io::Read;

    fn png(path: &Path, size: (u32, u32)) {
        with_surface(path, size, "test", |canvas| {
            canvas.draw(&Rectangle::new([(2, 2), (10, 10)], BLUE.filled()))?;
            Ok(())
        })
        .unwrap();
    }

    fn archive(path: &Path) -> zip::ZipArchive<File> {
        zip::ZipArchive::new(File::open(path).unwrap()).unwrap()
    }

    #[test]
    fn test_word_report_embeds_every_image() {
        let dir = tempfile::tempdir().unwrap();
        png(&dir.path().join("figures/01_a.png"), (60, 30));
        png(&dir.path().join("figures/02_b.png"), (40, 40));

        let markdown = "# Title\n\n\
            - **Baseline:** base\n\n\
            #### Chart 1: A\n\n\
            ![Chart 1: A](figures/01_a.png)\n\n\
            *First caption.*\n\n\
            #### Chart 2: B\n\n\
            ![Chart 2: B](figures/02_b.png)\n\n\
            | Scenario | Mean |\n\
            |:---|---:|\n\
            | base | 110.0 |\n";
        let out = dir.path().join(WORD_FILE);
        let images = write_word_report(markdown, dir.path(), &out).unwrap();
        assert_eq!(images, 2);

        let mut zip = archive(&out);
        let media = zip.file_names().filter(|n| n.contains("media/")).count();
        assert_eq!(media, 2);

        let mut xml = String::new();
        zip.by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        assert!(xml.contains("Chart 1: A"));
        assert!(xml.contains("First caption."));
        assert!(xml.contains("110.0"));
        assert!(!xml.contains("|:---"));
    }

    #[test]
    fn test_missing_image_is_rendering_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join(WORD_FILE);
        let err = write_word_report("![gone](figures/gone.png)\n", dir.path(), &out).unwrap_err();
        assert!(matches!(err, PipelineError::Rendering { .. }));
    }

    #[test]
    fn test_markdown_helpers() {
        assert_eq!(heading("### 3.1 Trends"), Some((3, "3.1 Trends")));
        assert_eq!(heading("#nope"), None);
        assert_eq!(image_path("![t](figures/x.png)"), Some("figures/x.png"));
        assert_eq!(caption("*Note.*"), Some("Note."));
        assert_eq!(caption("**Key results:**"), None);
        assert_eq!(list_item("  - Mean: 1"), "    \u{2022} Mean: 1");
        assert_eq!(
            strip_links("1. [Executive Summary](#1-executive-summary)"),
            "1. Executive Summary"
        );
        assert!(is_alignment_row(&["|:---".trim_matches('|').to_string(), "---:".to_string()]));
    }

    #[test]
    fn test_png_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.png");
        png(&path, (64, 24));
        assert_eq!(png_dimensions(&std::fs::read(&path).unwrap()), Some((64, 24)));
        assert_eq!(png_dimensions(b"not a png"), None);
    }
}
