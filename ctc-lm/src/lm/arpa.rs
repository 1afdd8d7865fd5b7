use std::io::BufRead;
use std::sync::LazyLock;

use regex::Regex;

use super::LanguageModelError;

static NGRAM_COUNT_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^ngram\s+(\d+)\s*=\s*(\d+)$"));
static SECTION_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\\(\d+)-grams:$"));

/// One n-gram line of an ARPA file.
#[derive(Debug, Clone, PartialEq)]
pub struct ArpaEntry {
    pub words: Vec<String>,
    pub log_prob: f32,
    pub backoff: f32,
}

/// Raw contents of an ARPA file, grouped by order (`grams[0]` are unigrams).
#[derive(Debug, Clone, Default)]
pub struct ArpaModel {
    pub counts: Vec<usize>,
    pub grams: Vec<Vec<ArpaEntry>>,
}

impl ArpaModel {
    pub fn order(&self) -> usize {
        self.counts.len()
    }
}

#[derive(Clone, Copy)]
enum Section {
    Preamble,
    Data,
    Grams(usize),
    End,
}

fn compiled(
    re: &'static LazyLock<Result<Regex, regex::Error>>,
) -> Result<&'static Regex, LanguageModelError> {
    re.as_ref()
        .map_err(|e| LanguageModelError::parse(0, format!("internal pattern error: {e}")))
}

fn parse_float(field: &str, line: usize) -> Result<f32, LanguageModelError> {
    field
        .parse::<f32>()
        .map_err(|_| LanguageModelError::parse(line, format!("expected a number, got {field:?}")))
}

/// Reads an ARPA back-off model.
///
/// The `\data\` header must list every order, each `\N-grams:` section must
/// hold exactly the announced number of entries, and the file must close with
/// `\end\`.
pub fn parse_arpa<R: BufRead>(reader: R) -> Result<ArpaModel, LanguageModelError> {
    let count_re = compiled(&NGRAM_COUNT_RE)?;
    let section_re = compiled(&SECTION_RE)?;

    let mut model = ArpaModel::default();
    let mut section = Section::Preamble;
    let mut line_no = 0;

    for line in reader.lines() {
        let line = line?;
        line_no += 1;
        let trimmed = line.trim();

        match section {
            Section::Preamble => {
                if trimmed == "\\data\\" {
                    section = Section::Data;
                }
            }
            Section::Data => {
                if trimmed.is_empty() {
                    continue;
                }
                if let Some(caps) = count_re.captures(trimmed) {
                    let order: usize = caps[1]
                        .parse()
                        .map_err(|_| LanguageModelError::parse(line_no, "bad n-gram order"))?;
                    let count: usize = caps[2]
                        .parse()
                        .map_err(|_| LanguageModelError::parse(line_no, "bad n-gram count"))?;
                    if order != model.counts.len() + 1 {
                        return Err(LanguageModelError::parse(
                            line_no,
                            format!(
                                "expected count for order {}, found {order}",
                                model.counts.len() + 1
                            ),
                        ));
                    }
                    model.counts.push(count);
                    continue;
                }
                section = enter_section(trimmed, section_re, &mut model, line_no)?;
            }
            Section::Grams(order) => {
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed.starts_with('\\') {
                    check_section_complete(&model, order, line_no)?;
                    section = if trimmed == "\\end\\" {
                        Section::End
                    } else {
                        enter_section(trimmed, section_re, &mut model, line_no)?
                    };
                    continue;
                }
                let entry = parse_entry(trimmed, order, line_no)?;
                model.grams[order - 1].push(entry);
            }
            Section::End => {
                if !trimmed.is_empty() {
                    return Err(LanguageModelError::parse(line_no, "content after \\end\\"));
                }
            }
        }
    }

    match section {
        Section::End => {}
        _ => return Err(LanguageModelError::parse(line_no, "missing \\end\\ marker")),
    }
    if model.grams.len() != model.counts.len() {
        return Err(LanguageModelError::parse(
            line_no,
            format!(
                "header announces {} orders but {} sections were found",
                model.counts.len(),
                model.grams.len()
            ),
        ));
    }
    Ok(model)
}

fn enter_section(
    trimmed: &str,
    section_re: &Regex,
    model: &mut ArpaModel,
    line_no: usize,
) -> Result<Section, LanguageModelError> {
    let caps = section_re
        .captures(trimmed)
        .ok_or_else(|| LanguageModelError::parse(line_no, format!("unexpected line {trimmed:?}")))?;
    let order: usize = caps[1]
        .parse()
        .map_err(|_| LanguageModelError::parse(line_no, "bad section order"))?;
    if order != model.grams.len() + 1 || order > model.counts.len() {
        return Err(LanguageModelError::parse(
            line_no,
            format!("unexpected section for order {order}"),
        ));
    }
    model.grams.push(Vec::with_capacity(model.counts[order - 1]));
    Ok(Section::Grams(order))
}

fn check_section_complete(
    model: &ArpaModel,
    order: usize,
    line_no: usize,
) -> Result<(), LanguageModelError> {
    let found = model.grams[order - 1].len();
    let expected = model.counts[order - 1];
    if found != expected {
        return Err(LanguageModelError::parse(
            line_no,
            format!("{order}-gram section has {found} entries, header announced {expected}"),
        ));
    }
    Ok(())
}

fn parse_entry(line: &str, order: usize, line_no: usize) -> Result<ArpaEntry, LanguageModelError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != order + 1 && fields.len() != order + 2 {
        return Err(LanguageModelError::parse(
            line_no,
            format!("{order}-gram entry has {} fields", fields.len()),
        ));
    }
    let log_prob = parse_float(fields[0], line_no)?;
    let backoff = match fields.get(order + 1) {
        Some(field) => parse_float(field, line_no)?,
        None => 0.0,
    };
    Ok(ArpaEntry {
        words: fields[1..=order].iter().map(|w| w.to_string()).collect(),
        log_prob,
        backoff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "\\data\\
ngram 1=3
ngram 2=1

\\1-grams:
-1.0\t<s>\t-0.5
-0.5\t</s>
-0.7\thello\t-0.2

\\2-grams:
-0.1\t<s>\thello

\\end\\
";

    #[test]
    fn parses_counts_and_sections() {
        let model = parse_arpa(SMALL.as_bytes()).unwrap();
        assert_eq!(model.order(), 2);
        assert_eq!(model.counts, vec![3, 1]);
        assert_eq!(model.grams[0].len(), 3);
        assert_eq!(model.grams[0][1].backoff, 0.0);
        assert_eq!(model.grams[1][0].words, vec!["<s>", "hello"]);
        assert!((model.grams[1][0].log_prob + 0.1).abs() < 1e-6);
    }

    #[test]
    fn rejects_count_mismatch() {
        let broken = SMALL.replace("ngram 1=3", "ngram 1=4");
        assert!(matches!(
            parse_arpa(broken.as_bytes()),
            Err(LanguageModelError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_missing_end_marker() {
        let broken = SMALL.replace("\\end\\", "");
        assert!(parse_arpa(broken.as_bytes()).is_err());
    }

    #[test]
    fn rejects_bad_probability() {
        let broken = SMALL.replace("-0.7\thello", "x\thello");
        let err = parse_arpa(broken.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 8"));
    }
}
