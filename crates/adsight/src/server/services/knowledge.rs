//! Static best-practice tips keyed by platform and creative type

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};

use super::summarizer::AdTable;

/// platform -> creative type -> tip
static KNOWLEDGE_BASE: Lazy<HashMap<&'static str, HashMap<&'static str, &'static str>>> =
  Lazy::new(|| {
    HashMap::from([
      (
        "Facebook",
        HashMap::from([
          (
            "carousel",
            "Carousel ads on Facebook often have higher engagement for e-commerce and storytelling.",
          ),
          ("video", "Video ads on Facebook perform best when under 15 seconds and with captions."),
          ("image", "High-contrast images with minimal text work well on Facebook."),
        ]),
      ),
      (
        "Instagram",
        HashMap::from([
          ("story", "Instagram Stories with interactive elements (polls, stickers) boost engagement."),
          ("reel", "Short, vertical videos with trending music perform well as Reels."),
          ("image", "Bright, visually striking images are most effective on Instagram feeds."),
        ]),
      ),
      (
        "Google",
        HashMap::from([
          ("search", "Use clear, keyword-rich headlines and strong CTAs in Google Search ads."),
          ("display", "Responsive display ads with multiple asset variations improve reach."),
          ("video", "YouTube ads should capture attention in the first 5 seconds."),
        ]),
      ),
    ])
  });

const PLATFORM_HEADERS: [&str; 1] = ["platform"];
const AD_TYPE_HEADERS: [&str; 2] = ["ad type", "creative type"];

/// Platform and creative type detected in an upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignProfile {
  pub platform: Option<String>,
  pub ad_type: Option<String>,
}

impl CampaignProfile {
  /// Resolve the profile from the table's recognised columns
  pub fn from_table(table: &AdTable) -> Self {
    let mut profile = CampaignProfile::default();

    for (index, header) in table.columns().iter().enumerate() {
      let normalized = normalize_header(header);
      if PLATFORM_HEADERS.contains(&normalized.as_str()) {
        profile.platform = column_mode(table.column_values(index));
      }
      if AD_TYPE_HEADERS.contains(&normalized.as_str()) {
        profile.ad_type = column_mode(table.column_values(index));
      }
    }

    profile
  }

  /// The formatted tip for this profile, or an empty string
  pub fn tip(&self) -> String {
    match (&self.platform, &self.ad_type) {
      (Some(platform), Some(ad_type)) => lookup_tip(platform, ad_type)
        .map(|tip| format!("Best practice for {platform} {ad_type} ads: {tip}"))
        .unwrap_or_default(),
      _ => String::new(),
    }
  }
}

/// Raw tip text for a (platform, creative type) pair, case-insensitive
pub fn lookup_tip(platform: &str, ad_type: &str) -> Option<&'static str> {
  let platform = platform.trim();
  let ad_type = ad_type.trim().to_lowercase();

  KNOWLEDGE_BASE
    .iter()
    .find(|(name, _)| name.eq_ignore_ascii_case(platform))
    .and_then(|(_, tips)| tips.get(ad_type.as_str()).copied())
}

fn normalize_header(header: &str) -> String {
  header.trim().to_lowercase().replace('_', " ")
}

/// Most frequent non-blank value; ties go to the smallest value
fn column_mode<'a>(cells: impl Iterator<Item = &'a str>) -> Option<String> {
  let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
  for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
    *counts.entry(cell).or_default() += 1;
  }

  // BTreeMap iterates in ascending order, so the first maximum wins ties
  let mut best: Option<(&str, usize)> = None;
  for (value, count) in counts {
    if best.map_or(true, |(_, best_count)| count > best_count) {
      best = Some((value, count));
    }
  }
  best.map(|(value, _)| value.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn profile(csv: &str) -> CampaignProfile {
    CampaignProfile::from_table(&AdTable::from_csv_bytes(csv.as_bytes()).unwrap())
  }

  #[test]
  fn test_facebook_video_tip() {
    let p = profile("Platform,Ad Type,clicks\nFacebook,video,10\nFacebook,video,12\n");
    assert_eq!(p.platform.as_deref(), Some("Facebook"));
    assert_eq!(p.ad_type.as_deref(), Some("video"));

    let tip = p.tip();
    assert!(tip.starts_with("Best practice for Facebook video ads:"));
    assert!(tip.contains("under 15 seconds and with captions"));
  }

  #[test]
  fn test_unknown_platform_yields_no_tip() {
    assert!(profile("platform,ad type\nTwitter,video\n").tip().is_empty());
  }

  #[test]
  fn test_missing_ad_type_column_yields_no_tip() {
    let p = profile("platform,clicks\nFacebook,3\n");
    assert_eq!(p.platform.as_deref(), Some("Facebook"));
    assert!(p.ad_type.is_none());
    assert!(p.tip().is_empty());
  }

  #[test]
  fn test_creative_type_header_and_case_insensitive_values() {
    let p = profile("PLATFORM,creative_type\ninstagram,Reel\n");
    assert!(p.tip().contains("trending music"));
  }

  #[test]
  fn test_lowercase_platform_still_gets_tip_in_upload_casing() {
    let p = profile("platform,ad type\nfacebook,video\n");
    assert!(p.tip().starts_with("Best practice for facebook video ads:"));
  }

  #[test]
  fn test_mode_picks_most_common_value() {
    let p = profile("platform,ad type\nGoogle,search\nFacebook,image\nGoogle,search\n");
    assert_eq!(p.platform.as_deref(), Some("Google"));
    assert_eq!(p.ad_type.as_deref(), Some("search"));
  }

  #[test]
  fn test_mode_ties_resolve_to_smallest_value() {
    let p = profile("platform,ad type\nInstagram,image\nFacebook,image\n");
    assert_eq!(p.platform.as_deref(), Some("Facebook"));
  }

  #[test]
  fn test_blank_cells_do_not_count_toward_mode() {
    let p = profile("platform,ad type\n,video\n,video\nGoogle,video\n");
    assert_eq!(p.platform.as_deref(), Some("Google"));
  }

  #[test]
  fn test_lookup_tip_pairs() {
    assert!(lookup_tip("Google", "display").is_some());
    assert!(lookup_tip("Google", "story").is_none());
    assert!(lookup_tip("TikTok", "video").is_none());
  }
}
