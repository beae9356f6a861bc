//! Structural GLSL front end for the headless device.
//!
//! This is not a GLSL compiler. It checks what a driver would reject before
//! type checking (version directive, characters, bracket nesting, statement
//! terminators, top-level declaration shape) and extracts the stage
//! interface (`uniform`, `in`, `out` declarations and defined functions) that
//! linking needs.

use crate::glsl::{parse_version_directive, VersionDirective};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Declaration {
    pub ty: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct StageInterface {
    pub uniforms: Vec<Declaration>,
    pub inputs: Vec<Declaration>,
    pub outputs: Vec<Declaration>,
    pub functions: Vec<String>,
}

impl StageInterface {
    pub fn has_main(&self) -> bool {
        self.functions.iter().any(|f| f == "main")
    }
}

#[derive(Debug, Clone)]
struct Token {
    text: String,
    line: usize,
}

const PUNCTUATION: &str = "(){}[];,=+-*/<>!&|^%?:~.";

const QUALIFIERS: &[&str] = &[
    "flat",
    "smooth",
    "noperspective",
    "centroid",
    "sample",
    "invariant",
    "precise",
    "highp",
    "mediump",
    "lowp",
    "const",
];

fn error(line: usize, message: impl std::fmt::Display) -> String {
    format!("0:{line}: error: {message}")
}

/// Check `source` and return its interface, or a driver-style error log.
pub(crate) fn analyze(source: &str) -> Result<StageInterface, String> {
    let version: VersionDirective = parse_version_directive(source)
        .ok_or_else(|| error(1, "missing or malformed #version directive"))?;
    if !version.is_known() {
        return Err(error(1, format!("GLSL {} is not supported", version.number)));
    }

    let tokens = tokenize(source)?;
    check_nesting(&tokens)?;
    check_terminators(&tokens)?;
    collect_interface(&tokens)
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut in_block_comment = false;

    for (index, raw_line) in source.lines().enumerate() {
        let line = index + 1;
        let mut chars = raw_line.chars().peekable();

        if !in_block_comment && raw_line.trim_start().starts_with('#') {
            continue;
        }

        let mut word = String::new();
        let flush = |word: &mut String, tokens: &mut Vec<Token>| {
            if !word.is_empty() {
                tokens.push(Token {
                    text: std::mem::take(word),
                    line,
                });
            }
        };

        while let Some(c) = chars.next() {
            if in_block_comment {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    in_block_comment = false;
                }
                continue;
            }
            match c {
                '/' if chars.peek() == Some(&'/') => {
                    break;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    flush(&mut word, &mut tokens);
                    in_block_comment = true;
                }
                c if c.is_ascii_alphanumeric() || c == '_' => word.push(c),
                // Decimal point inside a number, e.g. `1.0`.
                '.' if !word.is_empty() && word.chars().all(|w| w.is_ascii_digit()) => word.push(c),
                c if c.is_whitespace() => flush(&mut word, &mut tokens),
                c if PUNCTUATION.contains(c) => {
                    flush(&mut word, &mut tokens);
                    tokens.push(Token {
                        text: c.to_string(),
                        line,
                    });
                }
                other => return Err(error(line, format!("unexpected character '{other}'"))),
            }
        }
        flush(&mut word, &mut tokens);
    }

    Ok(tokens)
}

fn closing(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

fn check_nesting(tokens: &[Token]) -> Result<(), String> {
    let mut stack: Vec<&Token> = Vec::new();
    for token in tokens {
        match token.text.as_str() {
            "(" | "[" | "{" => stack.push(token),
            ")" | "]" | "}" => match stack.pop() {
                Some(open) if closing(&open.text) == token.text => {}
                Some(open) => {
                    return Err(error(
                        token.line,
                        format!(
                            "syntax error, unexpected '{}', expecting '{}'",
                            token.text,
                            closing(&open.text)
                        ),
                    ))
                }
                None => {
                    return Err(error(
                        token.line,
                        format!("syntax error, unexpected '{}'", token.text),
                    ))
                }
            },
            _ => {}
        }
    }
    match stack.pop() {
        Some(open) => Err(error(
            open.line,
            format!("syntax error, unexpected end of file, '{}' is never closed", open.text),
        )),
        None => Ok(()),
    }
}

/// Every statement inside a block must end with `;` before the closing brace.
fn check_terminators(tokens: &[Token]) -> Result<(), String> {
    for pair in tokens.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        if current.text == "}" && !matches!(previous.text.as_str(), ";" | "{" | "}") {
            return Err(error(
                current.line,
                format!("syntax error, unexpected '}}', expecting ';' after '{}'", previous.text),
            ));
        }
    }
    Ok(())
}

/// Index of the token closing the bracket opened at `open`.
fn matching(tokens: &[Token], open: usize) -> usize {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.text.as_str() {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    tokens.len() - 1
}

fn collect_interface(tokens: &[Token]) -> Result<StageInterface, String> {
    let mut interface = StageInterface::default();
    let mut start = 0;
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i].text.as_str() {
            ";" => {
                declaration(&tokens[start..i], &mut interface);
                i += 1;
                start = i;
            }
            "(" | "[" => i = matching(tokens, i) + 1,
            "{" => {
                let close = matching(tokens, i);
                if i > start && tokens[i - 1].text == ")" {
                    function_header(&tokens[start..i], &mut interface)?;
                    i = close + 1;
                    start = i;
                } else {
                    // Interface block: `uniform Name { ... } instance;`
                    i = close + 1;
                }
            }
            _ => i += 1,
        }
    }

    if start < tokens.len() {
        let last = &tokens[tokens.len() - 1];
        return Err(error(
            last.line,
            format!("syntax error, unexpected end of file after '{}'", last.text),
        ));
    }

    Ok(interface)
}

fn function_header(header: &[Token], interface: &mut StageInterface) -> Result<(), String> {
    let paren = header
        .iter()
        .position(|t| t.text == "(")
        .unwrap_or(header.len());
    let words: Vec<&Token> = header[..paren]
        .iter()
        .filter(|t| !QUALIFIERS.contains(&t.text.as_str()))
        .collect();

    match words.as_slice() {
        [_, name] => {
            interface.functions.push(name.text.clone());
            Ok(())
        }
        [.., unexpected, _] => Err(error(
            unexpected.line,
            format!("syntax error, unexpected '{}', expecting ';'", unexpected.text),
        )),
        _ => {
            let at = header.first().map_or(1, |t| t.line);
            Err(error(at, "syntax error, function definition without a name"))
        }
    }
}

fn declaration(tokens: &[Token], interface: &mut StageInterface) {
    // Interface block members are not individual uniforms.
    if tokens.iter().any(|t| t.text == "{") {
        return;
    }

    let mut rest = tokens;

    if rest.first().is_some_and(|t| t.text == "layout") && rest.get(1).is_some_and(|t| t.text == "(") {
        let close = rest.iter().position(|t| t.text == ")").unwrap_or(rest.len() - 1);
        rest = &rest[close + 1..];
    }

    let mut storage = None;
    let mut words = Vec::new();
    for token in rest {
        match token.text.as_str() {
            "uniform" | "in" | "out" | "attribute" | "varying" if storage.is_none() && words.is_empty() => {
                storage = Some(token.text.as_str());
            }
            q if QUALIFIERS.contains(&q) => {}
            _ => words.push(token.text.as_str()),
        }
    }

    let Some(storage) = storage else {
        return;
    };
    let Some((&ty, names)) = words.split_first() else {
        return;
    };

    // `float a, b[2], c` -> a, b, c
    let mut declared = Vec::new();
    let mut expecting_name = true;
    let mut depth = 0usize;
    for &word in names {
        match word {
            "[" | "(" => depth += 1,
            "]" | ")" => depth = depth.saturating_sub(1),
            "," if depth == 0 => expecting_name = true,
            "=" => expecting_name = false,
            w if depth == 0 && expecting_name => {
                declared.push(Declaration {
                    ty: ty.to_owned(),
                    name: w.to_owned(),
                });
                expecting_name = false;
            }
            _ => {}
        }
    }

    let list = match storage {
        "uniform" => &mut interface.uniforms,
        "in" | "attribute" => &mut interface.inputs,
        _ => &mut interface.outputs,
    };
    list.extend(declared);
}
