//! Content Formatter — bidirectional transforms between semi-structured plain
//! text, structured blocks, and HTML, plus the section-aware preview
//! formatters. Everything here is pure and total: bad input degrades to a
//! readable paragraph, it never errors.

pub mod blocks;
pub mod html;
pub mod inline;
pub mod sections;

pub use blocks::{blocks_to_plain, parse_blocks, parse_blocks_with, Block, ParseOutcome};
pub use html::{
    convert_html_to_plain, is_normalized_empty, render_blocks_html, strip_rich_artifacts,
};
pub use sections::{render_experience_html, render_generic_html, render_technical_html};
