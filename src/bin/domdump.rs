//! domdump -- parse HTML files into a document model and print views of it.
//!
//! Reads each file (or stdin for `-`) as bytes, detects its encoding, builds
//! a `Document` and prints the serialized markup, or the text, title, element
//! count or a lookup result.

use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;

use readable_dom::builder::{build_document, build_into};
use readable_dom::encoding::decode_to_utf8;
use readable_dom::error::ParseDiagnostic;
use readable_dom::parse::{
    parse_document_with_options, parse_fragment_with_options, ParseOptions, Tag,
    DEFAULT_MAX_DEPTH,
};
use readable_dom::{Document, NodeId};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// domdump -- inspect the document model built from HTML files.
#[derive(Parser, Debug)]
#[command(name = "domdump", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// HTML files to process (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// URL of the document, used as document and base URI.
    #[arg(long, value_name = "URL", default_value = "")]
    url: String,

    /// Parse the input as a `body` fragment instead of a whole document.
    #[arg(long)]
    fragment: bool,

    /// Maximum element nesting depth before content is flattened.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    // -- Selection ---------------------------------------------------------
    /// Select all elements with this tag name.
    #[arg(long, value_name = "NAME", conflicts_with = "id")]
    tag: Option<String>,

    /// Select the first element with this id.
    #[arg(long, value_name = "ID")]
    id: Option<String>,

    // -- Output ------------------------------------------------------------
    /// Print the document title.
    #[arg(long)]
    title: bool,

    /// Print text content instead of markup.
    #[arg(long)]
    text: bool,

    /// Print the number of selected elements (all elements without a
    /// selection).
    #[arg(long)]
    count: bool,

    /// Print parse diagnostics to stderr.
    #[arg(long)]
    diagnostics: bool,
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_INPUT_ERROR: u8 = 1;
const EXIT_NO_MATCH: u8 = 2;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut worst_exit: u8 = EXIT_SUCCESS;

    for file in &cli.files {
        let exit = process_file(&cli, file);
        if exit > worst_exit {
            worst_exit = exit;
        }
    }

    ExitCode::from(worst_exit)
}

/// A built document and the node views are taken from: the document node,
/// or the `body` element holding a fragment.
struct Built {
    doc: Document,
    scope: NodeId,
    diagnostics: Vec<ParseDiagnostic>,
}

/// Processes a single input file and returns an exit code.
fn process_file(cli: &Cli, filename: &str) -> u8 {
    let bytes = match read_input(filename) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{filename}: failed to read: {e}");
            return EXIT_INPUT_ERROR;
        }
    };

    let html = match decode_to_utf8(&bytes) {
        Ok(html) => html,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_INPUT_ERROR;
        }
    };

    let built = build(cli, &html);
    if cli.diagnostics {
        for diag in &built.diagnostics {
            eprintln!("{filename}: {diag}");
        }
    }

    if cli.title {
        println!("{}", built.doc.title());
        return EXIT_SUCCESS;
    }

    let selected = select(cli, &built);
    if cli.count {
        println!("{}", selected.len());
        return EXIT_SUCCESS;
    }
    if selected.is_empty() {
        eprintln!("{filename}: no matching element");
        return EXIT_NO_MATCH;
    }

    for node in selected {
        println!("{}", render(cli, &built, node));
    }
    EXIT_SUCCESS
}

// ---------------------------------------------------------------------------
// Input reading
// ---------------------------------------------------------------------------

/// Reads input from a file or stdin (when filename is `-`).
fn read_input(filename: &str) -> io::Result<Vec<u8>> {
    if filename == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(filename)
    }
}

// ---------------------------------------------------------------------------
// Building and output
// ---------------------------------------------------------------------------

fn build(cli: &Cli, html: &str) -> Built {
    let options = ParseOptions::default().max_depth(cli.max_depth);
    if cli.fragment {
        let tree = parse_fragment_with_options(html, Tag::BODY, &options);
        let mut doc = Document::new(&cli.url);
        let body = doc.create_element("body");
        let root = doc.root();
        // A fresh element under the document node always fits
        let _ = doc.append_child(root, body);
        if let Err(e) = build_into(&mut doc, body, &tree) {
            eprintln!("failed to build fragment: {e}");
        }
        Built {
            doc,
            scope: body,
            diagnostics: tree.diagnostics,
        }
    } else {
        let tree = parse_document_with_options(html, &options);
        let doc = build_document(&tree, &cli.url);
        let scope = doc.root();
        Built {
            doc,
            scope,
            diagnostics: tree.diagnostics,
        }
    }
}

fn select(cli: &Cli, built: &Built) -> Vec<NodeId> {
    let doc = &built.doc;
    if let Some(ref id) = cli.id {
        doc.get_element_by_id(built.scope, id).into_iter().collect()
    } else if let Some(ref tag) = cli.tag {
        doc.get_elements_by_tag_name(built.scope, tag)
    } else if cli.count {
        doc.get_elements_by_tag_name(built.scope, "*")
    } else {
        vec![built.scope]
    }
}

fn render(cli: &Cli, built: &Built, node: NodeId) -> String {
    let doc = &built.doc;
    if cli.text {
        doc.text_content(node)
    } else if node == built.scope {
        doc.inner_html(node)
    } else {
        doc.outer_html(node)
    }
}
