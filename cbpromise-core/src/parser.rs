//! TypeScript and JavaScript parsing using SWC
//!
//! Global invariants enforced:
//! - The dialect is chosen from the file extension alone
//! - Parse errors are reported, never recovered into a partial module

use anyhow::Result;
use std::path::Path;
use swc_common::{sync::Lrc, FileName, SourceFile, SourceMap};
use swc_ecma_ast::{EsVersion, Module};
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax, TsSyntax};

/// ECMAScript dialects the rule can be applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// TypeScript (.ts, .mts, .cts)
    TypeScript,
    /// TypeScript with JSX (.tsx)
    TypeScriptReact,
    /// JavaScript (.js, .mjs, .cjs)
    JavaScript,
    /// JavaScript with JSX (.jsx)
    JavaScriptReact,
}

impl Dialect {
    /// Detect the dialect from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "mts" | "cts" => Some(Dialect::TypeScript),
            "tsx" => Some(Dialect::TypeScriptReact),
            "js" | "mjs" | "cjs" => Some(Dialect::JavaScript),
            "jsx" => Some(Dialect::JavaScriptReact),
            _ => None,
        }
    }

    /// Detect the dialect from a file path
    ///
    /// Declaration files (`.d.ts`) have no function bodies and are rejected.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if is_declaration_file(name) {
            return None;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Dialect for a file name, falling back to plain JavaScript
    fn from_filename(filename: &str) -> Self {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(Dialect::JavaScript)
    }

    fn syntax(self, filename: &str) -> Syntax {
        match self {
            Dialect::TypeScript | Dialect::TypeScriptReact => Syntax::Typescript(TsSyntax {
                tsx: self == Dialect::TypeScriptReact,
                decorators: true,
                dts: is_declaration_file(filename),
                ..Default::default()
            }),
            Dialect::JavaScript | Dialect::JavaScriptReact => Syntax::Es(EsSyntax {
                jsx: self == Dialect::JavaScriptReact,
                decorators: true,
                ..Default::default()
            }),
        }
    }
}

fn is_declaration_file(filename: &str) -> bool {
    filename.ends_with(".d.ts") || filename.ends_with(".d.mts") || filename.ends_with(".d.cts")
}

/// Parse TypeScript, JavaScript, JSX, or TSX source code into an AST module
///
/// Unknown extensions are parsed as plain JavaScript.
pub fn parse_source(src: &str, source_map: &Lrc<SourceMap>, filename: &str) -> Result<Module> {
    let syntax = Dialect::from_filename(filename).syntax(filename);

    let source_file: Lrc<SourceFile> = source_map.new_source_file(
        FileName::Custom(filename.into()).into(),
        src.to_string(),
    );
    let input = StringInput::from(&*source_file);
    let lexer = Lexer::new(syntax, EsVersion::Es2022, input, None);
    let mut parser = Parser::new_from(lexer);

    let module = parser.parse_module().map_err(|e| {
        anyhow::anyhow!("Parse error: {}", e.kind().msg())
            .context(format!("Failed to parse source file: {}", filename))
    })?;

    // Recoverable errors still mean the tree does not reflect the source
    if let Some(e) = parser.take_errors().into_iter().next() {
        return Err(anyhow::anyhow!("Parse error: {}", e.kind().msg())
            .context(format!("Failed to parse source file: {}", filename)));
    }

    Ok(module)
}
