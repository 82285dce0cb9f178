//! Reading model replies. Both parsers are lenient: the model is told the
//! exact format, but the output is never trusted to follow it.

/// Split a comma- or newline-separated reply into candidate tags.
///
/// List bullets and surrounding quotes are removed; empty entries are
/// dropped. Nothing else is filtered here.
pub fn tag_list(content: &str) -> Vec<String> {
  content
    .split([',', '\n'])
    .map(|t| {
      t.trim()
        .trim_start_matches(['-', '*', '•'])
        .trim()
        .trim_matches(['\'', '"'])
        .trim()
    })
    .filter(|t| !t.is_empty())
    .map(str::to_owned)
    .collect()
}

/// The first run of ASCII digits in the reply, if any.
pub fn category_id(content: &str) -> Option<i64> {
  let start = content.find(|c: char| c.is_ascii_digit())?;
  let digits: String = content[start..]
    .chars()
    .take_while(char::is_ascii_digit)
    .collect();
  digits.parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tag_list_tolerates_formatting_noise() {
    assert_eq!(tag_list("'제주도, 쇠소깍, 투명카약'"), vec!["제주도", "쇠소깍", "투명카약"]);
    assert_eq!(tag_list("- TMI\n- 친절함\n"), vec!["TMI", "친절함"]);
    assert_eq!(tag_list(" , ,"), Vec::<String>::new());
    assert!(tag_list("").is_empty());
  }

  #[test]
  fn category_id_takes_the_first_number() {
    assert_eq!(category_id("7"), Some(7));
    assert_eq!(category_id(" 3\n"), Some(3));
    assert_eq!(category_id("캐릭터 ID: 12 (모험가)"), Some(12));
    assert_eq!(category_id("잘 모르겠습니다"), None);
    assert_eq!(category_id("99999999999999999999"), None);
  }
}
