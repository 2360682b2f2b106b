//! `Accept` / `Accept-Charset` preference parsing.
//!
//! Results keep the spelling of the *available* values and are ordered by
//! quality, then specificity of the matching header entry, then position of that
//! entry in the header, then position in the available list.

#[derive(Debug, Clone, PartialEq)]
struct CharsetRange {
    charset: String,
    q: f32,
    order: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct MediaRange {
    main: String,
    sub: String,
    params: Vec<(String, String)>,
    q: f32,
    order: usize,
}

#[derive(Debug, Clone, Copy)]
struct Priority {
    q: f32,
    specificity: u8,
    order: usize,
    index: usize,
}

impl Priority {
    /// Picks the header entry governing an available value: the most specific
    /// entry wins, then the higher quality, then the earlier one.
    fn beats(&self, other: &Priority) -> bool {
        if self.specificity != other.specificity {
            return self.specificity > other.specificity;
        }
        if self.q != other.q {
            return self.q > other.q;
        }
        self.order < other.order
    }
}

fn parse_quality(raw: &str) -> Option<f32> {
    let q = raw.trim().parse::<f32>().ok()?;
    (0.0..=1.0).contains(&q).then_some(q)
}

/// Split a parameter list (`a=b; q=0.5`) into lowercase keys and unquoted values.
fn split_params(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim().to_ascii_lowercase();
            if key.is_empty() {
                return None;
            }
            let value = value.trim().trim_matches('"').to_string();
            Some((key, value))
        })
        .collect()
}

fn parse_charset_ranges(header: &str) -> Vec<CharsetRange> {
    header
        .split(',')
        .enumerate()
        .filter_map(|(order, entry)| {
            let mut parts = entry.splitn(2, ';');
            let charset = parts.next()?.trim().to_ascii_lowercase();
            if charset.is_empty() {
                return None;
            }
            let mut q = 1.0;
            for (key, value) in split_params(parts.next().unwrap_or("")) {
                if key == "q" {
                    q = parse_quality(&value)?;
                }
            }
            Some(CharsetRange { charset, q, order })
        })
        .collect()
}

fn parse_media_range(entry: &str, order: usize) -> Option<MediaRange> {
    let mut parts = entry.splitn(2, ';');
    let essence = parts.next()?.trim().to_ascii_lowercase();
    if essence.is_empty() {
        return None;
    }
    let (main, sub) = if essence == "*" {
        ("*".to_string(), "*".to_string())
    } else {
        let (main, sub) = essence.split_once('/')?;
        if main.is_empty() || sub.is_empty() || sub.contains('/') {
            return None;
        }
        (main.to_string(), sub.to_string())
    };
    let mut q = 1.0;
    let mut params = Vec::new();
    for (key, value) in split_params(parts.next().unwrap_or("")) {
        if key == "q" {
            q = parse_quality(&value)?;
        } else {
            params.push((key, value));
        }
    }
    Some(MediaRange {
        main,
        sub,
        params,
        q,
        order,
    })
}

fn parse_media_ranges(header: &str) -> Vec<MediaRange> {
    header
        .split(',')
        .enumerate()
        .filter_map(|(order, entry)| parse_media_range(entry, order))
        .collect()
}

fn charset_priority(available: &str, index: usize, ranges: &[CharsetRange]) -> Option<Priority> {
    let available = available.to_ascii_lowercase();
    ranges
        .iter()
        .filter_map(|range| {
            let specificity = if range.charset == available {
                1
            } else if range.charset == "*" {
                0
            } else {
                return None;
            };
            Some(Priority {
                q: range.q,
                specificity,
                order: range.order,
                index,
            })
        })
        .reduce(|best, candidate| if candidate.beats(&best) { candidate } else { best })
}

fn media_priority(available: &str, index: usize, ranges: &[MediaRange]) -> Option<Priority> {
    let target = parse_media_range(available, 0)?;
    ranges
        .iter()
        .filter_map(|range| {
            let mut specificity = 0;
            if range.main == target.main {
                specificity |= 4;
            } else if range.main != "*" {
                return None;
            }
            if range.sub == target.sub {
                specificity |= 2;
            } else if range.sub != "*" {
                return None;
            }
            if !range.params.is_empty() {
                let all_match = range.params.iter().all(|(key, value)| {
                    target
                        .params
                        .iter()
                        .any(|(k, v)| k == key && v.eq_ignore_ascii_case(value))
                });
                if !all_match {
                    return None;
                }
                specificity |= 1;
            }
            Some(Priority {
                q: range.q,
                specificity,
                order: range.order,
                index,
            })
        })
        .reduce(|best, candidate| if candidate.beats(&best) { candidate } else { best })
}

fn rank(mut scored: Vec<(Priority, String)>) -> Vec<String> {
    scored.retain(|(priority, _)| priority.q > 0.0);
    scored.sort_by(|(a, _), (b, _)| {
        b.q.total_cmp(&a.q)
            .then(b.specificity.cmp(&a.specificity))
            .then(a.order.cmp(&b.order))
            .then(a.index.cmp(&b.index))
    });
    scored.into_iter().map(|(_, value)| value).collect()
}

/// Charsets from `available` acceptable under an `Accept-Charset` header, most preferred first.
#[must_use]
pub fn preferred_charsets(header: &str, available: &[String]) -> Vec<String> {
    let ranges = parse_charset_ranges(header);
    rank(
        available
            .iter()
            .enumerate()
            .filter_map(|(index, charset)| {
                charset_priority(charset, index, &ranges).map(|p| (p, charset.clone()))
            })
            .collect(),
    )
}

/// Media types from `available` acceptable under an `Accept` header, most preferred first.
#[must_use]
pub fn preferred_media_types(header: &str, available: &[String]) -> Vec<String> {
    let ranges = parse_media_ranges(header);
    rank(
        available
            .iter()
            .enumerate()
            .filter_map(|(index, media_type)| {
                media_priority(media_type, index, &ranges).map(|p| (p, media_type.clone()))
            })
            .collect(),
    )
}
