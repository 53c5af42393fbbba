//! System prompts for the LLM cleanup pass and vision OCR.
//!
//! Every prompt lives here so the pipeline modules stay free of long string
//! literals and tests can inspect prompts without calling a model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the LLM cleanup pass is asked to do with raw coordinate text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupRole {
    /// Reformat every coordinate block into `El\tx\ty\tz` rows.
    Isolate,
    /// Return the same text with OCR artefacts removed. (default)
    #[default]
    Clean,
    /// Isolate each coordinate block under a name line, blocks separated by
    /// a line of stars.
    Separate,
}

impl CleanupRole {
    /// The system prompt for this role.
    pub fn system_prompt(self) -> &'static str {
        match self {
            CleanupRole::Isolate => ISOLATE_PROMPT,
            CleanupRole::Clean => CLEAN_PROMPT,
            CleanupRole::Separate => SEPARATE_PROMPT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CleanupRole::Isolate => "isolate",
            CleanupRole::Clean => "clean",
            CleanupRole::Separate => "separate",
        }
    }
}

impl fmt::Display for CleanupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CleanupRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "isolate" => Ok(CleanupRole::Isolate),
            "clean" => Ok(CleanupRole::Clean),
            "separate" => Ok(CleanupRole::Separate),
            other => Err(format!(
                "unknown cleanup role '{other}' (expected isolate, clean, or separate)"
            )),
        }
    }
}

/// Line of stars the `separate` role puts between blocks.
pub const BLOCK_SEPARATOR: &str = "*******************";

/// Prompt for [`CleanupRole::Isolate`].
pub const ISOLATE_PROMPT: &str = concat!(
    "You are a helpful assistant. Your job is to take a string composed of multiple chemical XYZ coordinate blocks ",
    "and to format them correctly.\n",
    "An XYZ block looks like this: <ATOM_DESCRIPTOR>\t<NUMBER>\t<NUMBER>\t<NUMBER>. ",
    "The atom descriptor can be C, O, Na, I, ... and the numbers may be in scientific notation. ",
    "A coordinate is never an integer, always a precise decimal number. ",
    "An XYZ block always follows this general principle, but there may be extra columns, which you must discard, ",
    "and the formatting may vary. The produced template must stay the same regardless.\n",
    "Your answer must look like this:\n",
    "<ATOM_DESCRIPTOR>\t<NUMBER>\t<NUMBER>\t<NUMBER>\n",
    "<ATOM_DESCRIPTOR>\t<NUMBER>\t<NUMBER>\t<NUMBER>\n",
    "...\n",
    "Strictly adhere to the answer template and keep the columns aligned."
);

/// Prompt for [`CleanupRole::Clean`].
pub const CLEAN_PROMPT: &str = concat!(
    "You are a helpful assistant. Your job is to take a string composed of multiple chemical XYZ coordinate blocks ",
    "and to clean it.\n",
    "An XYZ block looks like this: <ATOM_DESCRIPTOR>\t<NUMBER>\t<NUMBER>\t<NUMBER>. ",
    "The atom descriptor can be C, O, Na, I, ... and the numbers may be in scientific notation. ",
    "A coordinate is never an integer, always a precise decimal number. ",
    "An XYZ block always follows this general principle, but there may be extra columns, which you must discard, ",
    "and the formatting may vary.\n",
    "Return the same string with inconsistencies removed. Inconsistencies are mainly spaces in odd places ",
    "and anything out of place that results from an OCR error.\n",
    "Do not add any text to your response, only return the cleaned string."
);

/// Prompt for [`CleanupRole::Separate`].
pub const SEPARATE_PROMPT: &str = concat!(
    "You are a helpful assistant. Your job is to take a string composed of multiple chemical XYZ coordinate blocks ",
    "and isolate them, separating blocks with a line of stars: *******************\n",
    "Remove everything that is not part of an XYZ coordinate block. ",
    "At the beginning of each block, write a unique name on its own line; it will be used as the file name."
);

/// Prompt for transcribing a rendered page with a vision model.
///
/// The output must look like plain OCR text so it can feed the same
/// segmenter as Tesseract output.
pub const VISION_OCR_PROMPT: &str = r#"You are an OCR engine. Transcribe the page image exactly as printed.

Rules:
- Output plain text only, one printed line per output line, top to bottom.
- Keep every line, including page headers, footers, and table captions.
- Keep table rows on a single line; separate cells with single spaces.
- Copy digits, signs, and decimal points exactly; never round or reformat numbers.
- Do NOT use Markdown, code fences, or commentary."#;
