//! Entry points: generate shuffled versions of an exam
//!
//! The source package is parsed once. Every version starts from a deep
//! clone of that parsed document, so nothing a version does to its blocks
//! can leak into another one.

use std::io::{Cursor, Write};

use chrono::{Datelike, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::answer_key::{AnswerCell, AnswerKey, VersionAnswers};
use crate::config::{MixerConfig, ShuffleMode};
use crate::error::Result;
use crate::ooxml::{fix_floating_images, parse_ooxml, Block};
use crate::segment::segment_document;
use crate::shuffle::{shuffle_part, ShuffleOptions};
use crate::validate::{validate_blocks, ValidationReport};

/// One generated exam
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVersion {
    /// Exam code, e.g. `"101"`
    pub code: String,
    /// `<prefix>_<code>.docx`
    pub file_name: String,
    /// Complete `.docx` package
    pub bytes: Vec<u8>,
}

/// Everything produced by one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixOutput {
    pub versions: Vec<GeneratedVersion>,
    pub answer_key: AnswerKey,
    /// Floating pictures converted to inline before mixing
    pub floating_images_fixed: usize,
}

impl MixOutput {
    pub fn version(&self, code: &str) -> Option<&GeneratedVersion> {
        self.versions.iter().find(|v| v.code == code)
    }

    /// All versions packed into a single zip archive
    pub fn bundle_zip(&self) -> Result<Vec<u8>> {
        let now = chrono::Local::now();
        let timestamp = zip::DateTime::from_date_and_time(
            u16::try_from(now.year()).unwrap_or(1980),
            now.month() as u8,
            now.day() as u8,
            now.hour() as u8,
            now.minute() as u8,
            now.second() as u8,
        )
        .unwrap_or_default();
        let options = FileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .last_modified_time(timestamp);

        let mut writer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut writer);
            for version in &self.versions {
                zip.start_file(version.file_name.as_str(), options)?;
                zip.write_all(&version.bytes)?;
            }
            zip.finish()?;
        }
        Ok(writer.into_inner())
    }
}

/// Blocks and answers of one mixed body
#[derive(Debug, Clone, PartialEq)]
pub struct MixedBody {
    pub blocks: Vec<Block>,
    pub answers: Vec<(u32, AnswerCell)>,
}

/// Segment, shuffle and renumber a body. Question numbers start at 1 and
/// run on across parts.
pub fn mix_body<R: Rng + ?Sized>(
    blocks: Vec<Block>,
    mode: ShuffleMode,
    options: &ShuffleOptions,
    rng: &mut R,
) -> MixedBody {
    let layout = segment_document(blocks, mode);
    if layout.question_count() == 0 {
        log::warn!("no 'Câu <n>' questions found, the body is copied unchanged");
    }

    let mut next_number = 1;
    let mut mixed = MixedBody {
        blocks: layout.intro,
        answers: Vec::new(),
    };
    for part in layout.parts {
        let outcome = shuffle_part(part, next_number, options, rng);
        next_number = outcome.next_number;
        mixed.blocks.extend(outcome.blocks);
        mixed.answers.extend(outcome.answers);
    }
    mixed
}

/// Generate `version_count` versions with default settings otherwise
pub fn generate_versions(
    source: &[u8],
    version_count: u32,
    shuffle_mode: ShuffleMode,
    version_code_start: u32,
) -> Result<MixOutput> {
    let config = MixerConfig {
        shuffle_mode,
        version_count,
        version_code_start,
        ..MixerConfig::default()
    };
    generate_with_config(source, &config)
}

/// Generate versions as described by `config`.
///
/// Fails only when the configuration is invalid or the source is not a
/// readable Word document; content problems degrade to `?` answers.
pub fn generate_with_config(source: &[u8], config: &MixerConfig) -> Result<MixOutput> {
    config.validate()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    generate_with_rng(source, config, &mut rng)
}

/// [`generate_with_config`] drawing from a caller-supplied generator.
/// Each version gets its own generator seeded from `rng`.
pub fn generate_with_rng<R: Rng + ?Sized>(
    source: &[u8],
    config: &MixerConfig,
    rng: &mut R,
) -> Result<MixOutput> {
    config.validate()?;
    let mut package = parse_ooxml(source)?;

    let mut floating_images_fixed = 0;
    if config.fix_floating_images {
        if let Some(root) = package.document.root_mut() {
            floating_images_fixed = fix_floating_images(root);
        }
        log::info!("converted {} floating image(s) to inline", floating_images_fixed);
    }

    let options = ShuffleOptions {
        true_false: config.true_false_mode,
        short_answer: config.short_answer,
        style: config.relabel_style.clone(),
    };

    let mut output = MixOutput {
        versions: Vec::with_capacity(config.version_count as usize),
        answer_key: AnswerKey::new(),
        floating_images_fixed,
    };

    for code in config.version_codes() {
        let mut version_rng = StdRng::seed_from_u64(rng.gen());
        let mut document = package.document.clone();
        let mut body = document.take_body()?;

        let blocks = std::mem::take(&mut body.blocks);
        let mixed = mix_body(blocks, config.shuffle_mode, &options, &mut version_rng);
        body.blocks = mixed.blocks;
        document.rebuild(body)?;
        let bytes = package.repackage(&document)?;

        let mut answers = VersionAnswers::new(code.as_str());
        answers.answers.extend(mixed.answers);
        log::info!(
            "version {}: {} questions, {} without a detected answer",
            code,
            answers.answers.len(),
            answers.missing_count()
        );

        output.versions.push(GeneratedVersion {
            file_name: config.file_name(&code),
            code,
            bytes,
        });
        output.answer_key.record(answers);
    }

    Ok(output)
}

/// Check a source document without generating anything
pub fn validate_document(source: &[u8]) -> Result<ValidationReport> {
    let package = parse_ooxml(source)?;
    Ok(validate_blocks(&package.document.blocks()))
}
