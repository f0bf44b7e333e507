use serde::{Deserialize, Serialize};

/// Latest-release document returned by the releases API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
    #[serde(default)]
    pub published_at: Option<String>,
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub id: u64,
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl Release {
    /// First asset whose name equals `name` exactly.
    pub fn find_asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn release(asset_names: &[&str]) -> Release {
        Release {
            id: 1,
            name: Some("Events".into()),
            tag_name: "v1".into(),
            assets: asset_names
                .iter()
                .enumerate()
                .map(|(i, name)| ReleaseAsset {
                    id: i as u64,
                    name: (*name).into(),
                    browser_download_url: format!("https://example.com/{name}"),
                    size: 10,
                    content_type: Some("application/json".into()),
                })
                .collect(),
            published_at: None,
        }
    }

    #[test]
    fn find_asset_picks_exact_name() {
        let release = release(&["other.json", "events.json"]);
        let asset = release.find_asset("events.json").unwrap();
        assert_eq!(asset.id, 1);
        assert_eq!(asset.browser_download_url, "https://example.com/events.json");
    }

    #[test]
    fn find_asset_is_case_sensitive() {
        let release = release(&["Events.JSON"]);
        assert!(release.find_asset("events.json").is_none());
        assert!(release.find_asset("events").is_none());
    }

    #[test]
    fn deserializes_github_shape() {
        let release: Release = serde_json::from_value(json!({
            "id": 123,
            "name": null,
            "tag_name": "v2024.11.07",
            "published_at": "2024-11-07T06:00:00Z",
            "assets": [{
                "id": 9,
                "name": "events.json",
                "browser_download_url": "https://github.com/o/r/releases/download/v1/events.json",
                "size": 2048,
                "content_type": "application/json",
                "download_count": 4
            }],
            "html_url": "https://github.com/o/r/releases/tag/v1"
        }))
        .unwrap();
        assert_eq!(release.tag_name, "v2024.11.07");
        assert_eq!(release.name, None);
        assert_eq!(release.assets[0].size, 2048);
    }
}
