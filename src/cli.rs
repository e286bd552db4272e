// ============================================================================
// Retouch CLI — headless session replay via command-line arguments
// ============================================================================
//
// Usage examples:
//   retouch --input photo.png --actions session.json --output result.png
//   retouch -i photo.jpg -o out.png                  (format inferred from output ext)
//   retouch -i *.jpg --actions edits.json --output-dir processed/ --format png
//
// No GUI is opened in CLI mode. The action stack from the session file is
// replayed on each input image and the result is written out.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::io::{self, DisplayFormat};
use crate::ops::actions::ActionStack;
use crate::ops::replay::apply_action;
use crate::session::SessionState;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Retouch headless image processor.
///
/// Replay recorded edit sessions on image files and convert between formats —
/// no GUI required.
#[derive(Parser, Debug)]
#[command(
    name = "retouch",
    about = "Retouch headless batch image processor",
    long_about = "Replay a recorded edit session on image files and convert between\n\
                  formats without opening the GUI. Supports PNG and JPEG output.\n\n\
                  Example:\n  \
                  retouch --input photo.png --actions session.json --output result.png\n  \
                  retouch -i *.jpg --actions edits.json --output-dir out/ --format png"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Session JSON whose action stack is replayed on each input image.
    /// If omitted, images are only loaded and re-saved (format conversion).
    #[arg(short, long, value_name = "SESSION.json")]
    pub actions: Option<PathBuf>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png or jpeg.
    /// When omitted, the format is inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1–100, default 90).
    #[arg(short, long, default_value_t = io::JPEG_QUALITY, value_name = "1-100")]
    pub quality: u8,

    /// Print per-action and per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process
    /// arguments. Used by `main()` to route before creating a window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    // Resolve glob patterns / literal paths → concrete PathBufs
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    // Multiple inputs require --output-dir, not --output
    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let format = parse_format(args.format.as_deref(), args.output.as_deref());

    // Load the session's action stack if provided
    let stack: Option<ActionStack> = match &args.actions {
        Some(path) => match SessionState::load(path) {
            Ok(session) => Some(session.action_stack),
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    // Create output directory if specified
    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "error: could not create output directory '{}': {}",
                dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let output_path = match build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            format,
        ) {
            Some(p) => p,
            None => {
                eprintln!(
                    "  error: cannot determine output path for '{}'.",
                    input_path.display()
                );
                any_failure = true;
                continue;
            }
        };

        match run_one(
            input_path,
            &output_path,
            stack.as_ref(),
            format,
            args.quality,
            args.verbose,
        ) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    stack: Option<&ActionStack>,
    format: DisplayFormat,
    quality: u8,
    verbose: bool,
) -> Result<(), String> {
    // -- Step 1: Load ----------------------------------------------------
    let (mut image, _bytes) = io::load_image(input).map_err(|e| format!("load failed: {}", e))?;

    // -- Step 2: Replay the action stack (optional) ----------------------
    if let Some(stack) = stack {
        for action in stack.actions() {
            let step_start = Instant::now();
            apply_action(&mut image, action);
            if verbose {
                println!(
                    "  [replay] {} ({:.0}ms)",
                    action.describe(),
                    step_start.elapsed().as_secs_f64() * 1000.0
                );
            }
        }
    }

    // -- Step 3: Save ----------------------------------------------------
    io::encode_and_write(&image, output, format, quality).map_err(|e| format!("save failed: {}", e))
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            // Literal path — use directly
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        // Treat as glob pattern
        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the output format from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> DisplayFormat {
    if let Some(f) = format_arg {
        return DisplayFormat::from_extension(f).unwrap_or(DisplayFormat::Png);
    }

    if let Some(out) = output {
        let ext = out.extension().and_then(|e| e.to_str()).unwrap_or("");
        return DisplayFormat::from_extension(ext).unwrap_or(DisplayFormat::Png);
    }

    DisplayFormat::Png
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_out` to stem if it would collide with the input path)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: DisplayFormat,
) -> Option<PathBuf> {
    // Explicit output path
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    // Write next to the input file
    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    // Avoid silent overwrite of the input
    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::actions::{Action, EnhanceKind, Operation};
    use image::Rgba;

    #[test]
    fn format_defaults_to_png() {
        assert_eq!(parse_format(None, None), DisplayFormat::Png);
        assert_eq!(parse_format(Some("bogus"), None), DisplayFormat::Png);
    }

    #[test]
    fn format_inferred_from_output_extension() {
        assert_eq!(
            parse_format(None, Some(Path::new("x/out.jpg"))),
            DisplayFormat::Jpeg
        );
        assert_eq!(
            parse_format(Some("jpeg"), Some(Path::new("out.png"))),
            DisplayFormat::Jpeg,
            "--format wins over the extension"
        );
    }

    #[test]
    fn output_path_avoids_clobbering_the_input() {
        let path = build_output_path(Path::new("dir/a.png"), None, None, DisplayFormat::Png);
        assert_eq!(path, Some(PathBuf::from("dir/a_out.png")));

        let path = build_output_path(Path::new("dir/a.jpg"), None, None, DisplayFormat::Png);
        assert_eq!(path, Some(PathBuf::from("dir/a.png")));
    }

    #[test]
    fn output_dir_derives_the_filename() {
        let path = build_output_path(
            Path::new("shots/photo.jpg"),
            None,
            Some(Path::new("out")),
            DisplayFormat::Jpeg,
        );
        assert_eq!(path, Some(PathBuf::from("out/photo.jpg")));
    }

    #[test]
    fn literal_inputs_resolve_without_globbing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.png");
        std::fs::write(&file, b"x").unwrap();

        let pattern = file.to_string_lossy().into_owned();
        let inputs = resolve_inputs(&[pattern.clone(), pattern]);
        assert_eq!(inputs, vec![file]);
    }

    #[test]
    fn run_one_replays_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");

        let img = image::RgbaImage::from_pixel(8, 8, Rgba([200, 150, 100, 255]));
        io::encode_and_write(&img, &input, DisplayFormat::Png, io::JPEG_QUALITY).unwrap();

        let mut stack = ActionStack::new();
        stack.push(Action {
            operation: Operation::Enhance {
                enhancement: EnhanceKind::Brightness,
                enhancement_factor: 0.0,
            },
            selection: None,
        });

        run_one(
            &input,
            &output,
            Some(&stack),
            DisplayFormat::Png,
            io::JPEG_QUALITY,
            false,
        )
        .unwrap();

        let (result, _) = io::load_image(&output).unwrap();
        assert!(result.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }
}
