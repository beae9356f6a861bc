//! GLSL `#version` directive parsing.

use std::fmt;

/// Profile named after the version number of a `#version` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    Core,
    Compatibility,
    Es,
}

/// A parsed `#version <number> [profile]` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionDirective {
    pub number: u16,
    pub profile: Profile,
}

/// Desktop GLSL versions a conforming driver may accept.
pub const DESKTOP_VERSIONS: [u16; 13] = [
    110, 120, 130, 140, 150, 330, 400, 410, 420, 430, 440, 450, 460,
];

/// GLSL ES versions.
pub const ES_VERSIONS: [u16; 4] = [100, 300, 310, 320];

impl VersionDirective {
    pub const fn core(number: u16) -> Self {
        Self {
            number,
            profile: Profile::Core,
        }
    }

    /// Whether this names a GLSL version that exists at all.
    pub fn is_known(&self) -> bool {
        match self.profile {
            Profile::Es => ES_VERSIONS.contains(&self.number),
            Profile::Core | Profile::Compatibility => DESKTOP_VERSIONS.contains(&self.number),
        }
    }
}

impl fmt::Display for VersionDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.profile {
            Profile::Core if self.number >= 150 => write!(f, "#version {} core", self.number),
            Profile::Core => write!(f, "#version {}", self.number),
            Profile::Compatibility => write!(f, "#version {} compatibility", self.number),
            Profile::Es => write!(f, "#version {} es", self.number),
        }
    }
}

/// Parse the first `#version` directive of `source`.
///
/// Returns `None` when the directive is absent or malformed. Only blank lines
/// and comments may precede it, and a comment may follow it on its line.
pub fn parse_version_directive(source: &str) -> Option<VersionDirective> {
    let mut in_block = false;
    for line in source.lines() {
        let line = strip_comments(line, &mut in_block);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let rest = line.strip_prefix('#')?.trim_start();
        let rest = rest.strip_prefix("version")?;
        let mut words = rest.split_whitespace();
        let number = words.next()?.parse().ok()?;
        let profile = match words.next() {
            None | Some("core") => Profile::Core,
            Some("compatibility") => Profile::Compatibility,
            Some("es") => Profile::Es,
            Some(_) => return None,
        };
        if words.next().is_some() {
            return None;
        }
        return Some(VersionDirective { number, profile });
    }
    None
}

/// `line` without its `//` and `/* */` comments. `in_block` carries an
/// unterminated block comment over to the next line.
fn strip_comments(line: &str, in_block: &mut bool) -> String {
    let mut kept = String::with_capacity(line.len());
    let mut rest = line;
    loop {
        if *in_block {
            match rest.find("*/") {
                Some(end) => {
                    rest = &rest[end + 2..];
                    *in_block = false;
                }
                None => return kept,
            }
        }
        match (rest.find("//"), rest.find("/*")) {
            (Some(line_start), Some(block_start)) if line_start < block_start => {
                kept.push_str(&rest[..line_start]);
                return kept;
            }
            (Some(line_start), None) => {
                kept.push_str(&rest[..line_start]);
                return kept;
            }
            (_, Some(block_start)) => {
                // A block comment separates tokens like whitespace does.
                kept.push_str(&rest[..block_start]);
                kept.push(' ');
                rest = &rest[block_start + 2..];
                *in_block = true;
            }
            (None, None) => {
                kept.push_str(rest);
                return kept;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_core_profile() {
        let src = "#version 330 core\nvoid main() {}";
        assert_eq!(
            parse_version_directive(src),
            Some(VersionDirective::core(330))
        );
    }

    #[test]
    fn skips_leading_comments() {
        let src = "// triangle\n\n#version 300 es\n";
        let v = parse_version_directive(src).unwrap();
        assert_eq!(v.profile, Profile::Es);
        assert!(v.is_known());
    }

    #[test]
    fn trailing_comment_on_directive_line() {
        assert_eq!(
            parse_version_directive("#version 330 core // tutorial\nvoid main() {}"),
            Some(VersionDirective::core(330))
        );
        assert_eq!(
            parse_version_directive("#version 330 /* profile */ core\n"),
            Some(VersionDirective::core(330))
        );
    }

    #[test]
    fn skips_leading_block_comments() {
        let src = "/* header */\n#version 330 core\n";
        assert_eq!(parse_version_directive(src), Some(VersionDirective::core(330)));

        let src = "/*\n * multi-line\n * header\n */\n#version 410 core\n";
        assert_eq!(parse_version_directive(src), Some(VersionDirective::core(410)));
    }

    #[test]
    fn directive_inside_a_comment_does_not_count() {
        assert_eq!(parse_version_directive("/* #version 330 core */\nvoid main() {}"), None);
        assert_eq!(parse_version_directive("// #version 330 core\n"), None);
    }

    #[test]
    fn rejects_code_before_directive() {
        assert_eq!(parse_version_directive("void main() {}\n#version 330"), None);
        assert_eq!(parse_version_directive("#version three"), None);
    }

    #[test]
    fn unknown_numbers_parse_but_are_not_known() {
        let v = parse_version_directive("#version 335").unwrap();
        assert!(!v.is_known());
    }

    #[test]
    fn display_round_trips() {
        let v = VersionDirective::core(330);
        assert_eq!(v.to_string(), "#version 330 core");
        assert_eq!(parse_version_directive(&v.to_string()), Some(v));
    }
}
