use regex::Regex;

lazy_static! {
  static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
  static ref FILE_ID_RE: Regex = Regex::new(r"/files/([^/?#]+)/preview").unwrap();
}

const UNITS: [&str; 5] = ["", "K", "M", "B", "T"];

/// Generate a fresh document/file id.
///
/// Backend ids are limited to 36 chars of `[a-zA-Z0-9._-]`, a simple uuid fits.
pub fn unique_id() -> String {
  uuid::Uuid::new_v4().simple().to_string()
}

fn decimals_for(value: f64) -> usize {
  if value < 10.0 {
    2
  } else if value < 100.0 {
    1
  } else {
    0
  }
}

fn round_to(value: f64, decimals: usize) -> f64 {
  let scale = 10f64.powi(decimals as i32);
  (value * scale).round() / scale
}

/// Format a follower count with three significant digits and a K/M/B/T suffix.
pub fn format_followers(count: u64) -> String {
  if count < 1000 {
    return count.to_string();
  }
  let mut unit = 0;
  let mut value = count as f64;
  while value >= 1000.0 && unit < UNITS.len() - 1 {
    value /= 1000.0;
    unit += 1;
  }
  loop {
    let mut decimals = decimals_for(value);
    let mut rounded = round_to(value, decimals);
    // rounding can push into the next decimal bucket (9.995 -> 10.0).
    let next = decimals_for(rounded);
    if next != decimals {
      decimals = next;
      rounded = round_to(value, decimals);
    }
    if rounded >= 1000.0 && unit < UNITS.len() - 1 {
      value /= 1000.0;
      unit += 1;
      continue;
    }
    return format!("{:.*}{}", decimals, rounded, UNITS[unit]);
  }
}

pub fn is_valid_email(email: &str) -> bool {
  EMAIL_RE.is_match(email)
}

/// Extract the stored file id from a preview URL (`.../files/<id>/preview`).
pub fn extract_file_id(url: &str) -> Option<&str> {
  FILE_ID_RE.captures(url)
    .and_then(|caps| caps.get(1))
    .map(|m| m.as_str())
}
