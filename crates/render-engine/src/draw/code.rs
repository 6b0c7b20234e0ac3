//! Code blocks with line numbers and light keyword highlighting.

use scenecast_scene_model::{CodeBlockProps, Rgba, ThemePalette};

use super::{revealed_lines, DrawContext, Pass};
use crate::glyphs::GlyphRasterizer;
use crate::paint::{rounded_rect, solid};

const LINE_HEIGHT: f32 = 1.4;

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "class", "const", "continue", "def", "else", "enum", "export",
    "false", "fn", "for", "from", "func", "function", "if", "impl", "import", "in", "interface",
    "let", "loop", "match", "mod", "mut", "new", "None", "null", "package", "pub", "return",
    "self", "static", "struct", "this", "trait", "true", "type", "use", "var", "while",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Plain,
    Keyword,
    Str,
    Comment,
}

pub(super) fn measure(glyphs: &GlyphRasterizer, p: &CodeBlockProps) -> (f64, f64) {
    let size = p.font_size as f32;
    let pad = p.padding as f32;
    let lines: Vec<&str> = p.code.split('\n').collect();
    let widest = lines
        .iter()
        .map(|l| glyphs.measure_line(l, size))
        .fold(0.0f32, f32::max);
    let w = pad * 2.0 + gutter_width(glyphs, p, lines.len()) + widest;
    let h = pad * 2.0 + size * LINE_HEIGHT * lines.len() as f32;
    (w as f64, h as f64)
}

fn gutter_width(glyphs: &GlyphRasterizer, p: &CodeBlockProps, line_count: usize) -> f32 {
    if !p.line_numbers {
        return 0.0;
    }
    let digits = line_count.max(1).to_string();
    glyphs.measure_line(&digits, p.font_size as f32) + p.font_size as f32
}

pub(super) fn paint(ctx: &mut DrawContext<'_>, p: &CodeBlockProps, pass: &Pass) {
    let palette = p.theme.palette();
    let size = p.font_size as f32;
    let pad = p.padding as f32;
    let line_h = size * LINE_HEIGHT;

    if let Some(path) = rounded_rect(0.0, 0.0, pass.width, pass.height, pad * 0.5) {
        ctx.pixmap.fill_path(
            &path,
            &solid(pass.color(palette.background)),
            tiny_skia::FillRule::Winding,
            pass.transform,
            None,
        );
    }

    let full: Vec<&str> = p.code.split('\n').collect();
    let gutter = gutter_width(ctx.glyphs, p, full.len());
    let metrics = ctx.glyphs.line_metrics(size);
    let comment_prefix = comment_prefix(&p.language);

    for (i, visible) in revealed_lines(&p.code, pass.anim.reveal).iter().enumerate() {
        let baseline =
            pad + i as f32 * line_h + (line_h - metrics.height()) / 2.0 + metrics.ascent;

        if p.line_numbers {
            let number = (i + 1).to_string();
            let num_w = ctx.glyphs.measure_line(&number, size);
            let x = pad + gutter - size - num_w;
            ctx.glyphs.draw_line(
                ctx.pixmap,
                &number,
                x,
                baseline,
                size,
                pass.color(palette.gutter),
                pass.transform,
            );
        }

        let mut x = pad + gutter;
        for (token, span) in tokenize(visible, comment_prefix) {
            ctx.glyphs.draw_line(
                ctx.pixmap,
                span,
                x,
                baseline,
                size,
                pass.color(token_color(&palette, token)),
                pass.transform,
            );
            x += ctx.glyphs.measure_line(span, size);
        }
    }
}

fn token_color(palette: &ThemePalette, token: Token) -> Rgba {
    match token {
        Token::Plain => palette.foreground,
        Token::Keyword => palette.keyword,
        Token::Str => palette.string,
        Token::Comment => palette.comment,
    }
}

fn comment_prefix(language: &str) -> &'static str {
    match language.to_ascii_lowercase().as_str() {
        "python" | "py" | "bash" | "sh" | "shell" | "ruby" | "yaml" | "toml" => "#",
        "sql" | "lua" | "haskell" => "--",
        _ => "//",
    }
}

fn tokenize<'a>(line: &'a str, comment: &str) -> Vec<(Token, &'a str)> {
    let mut tokens = Vec::new();
    let mut plain_start: Option<usize> = None;
    let mut iter = line.char_indices().peekable();

    while let Some(&(i, c)) = iter.peek() {
        if line[i..].starts_with(comment) {
            flush(line, &mut tokens, &mut plain_start, i);
            tokens.push((Token::Comment, &line[i..]));
            return tokens;
        }

        if c == '"' || c == '\'' {
            flush(line, &mut tokens, &mut plain_start, i);
            iter.next();
            let mut end = line.len();
            for (j, d) in iter.by_ref() {
                if d == c {
                    end = j + d.len_utf8();
                    break;
                }
            }
            tokens.push((Token::Str, &line[i..end]));
            continue;
        }

        if c.is_alphanumeric() || c == '_' {
            let mut end = i;
            while let Some(&(j, d)) = iter.peek() {
                if d.is_alphanumeric() || d == '_' {
                    end = j + d.len_utf8();
                    iter.next();
                } else {
                    break;
                }
            }
            let word = &line[i..end];
            if KEYWORDS.contains(&word) {
                flush(line, &mut tokens, &mut plain_start, i);
                tokens.push((Token::Keyword, word));
            } else if plain_start.is_none() {
                plain_start = Some(i);
            }
            continue;
        }

        if plain_start.is_none() {
            plain_start = Some(i);
        }
        iter.next();
    }

    flush(line, &mut tokens, &mut plain_start, line.len());
    tokens
}

fn flush<'a>(
    line: &'a str,
    tokens: &mut Vec<(Token, &'a str)>,
    start: &mut Option<usize>,
    end: usize,
) {
    if let Some(s) = start.take() {
        if s < end {
            tokens.push((Token::Plain, &line[s..end]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_classes() {
        let tokens = tokenize("let x = \"hi\"; // done", "//");
        assert_eq!(
            tokens,
            vec![
                (Token::Keyword, "let"),
                (Token::Plain, " x = "),
                (Token::Str, "\"hi\""),
                (Token::Plain, "; "),
                (Token::Comment, "// done"),
            ]
        );
    }

    #[test]
    fn test_tokenize_keeps_every_char() {
        let line = "fn main() { println!('x) }";
        let joined: String = tokenize(line, "//").iter().map(|(_, s)| *s).collect();
        assert_eq!(joined, line);
    }

    #[test]
    fn test_keywords_inside_identifiers_are_plain() {
        let tokens = tokenize("format", "//");
        assert_eq!(tokens, vec![(Token::Plain, "format")]);
    }
}
