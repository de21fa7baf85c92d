//! Media server URL layout

use crate::progress::ProgressRecord;
use crate::{Error, Result};
use url::Url;

/// URLs exposed by the media server for one base address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base: Url) -> Result<Self> {
        if base.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!("{} cannot be a base URL", base)));
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `/media/{file}/manifest.mpd`
    pub fn manifest(&self, file: &str) -> Result<Url> {
        self.media_resource(file, "manifest.mpd")
    }

    /// `/media/{file}/subtitles.txt`
    pub fn subtitles(&self, file: &str) -> Result<Url> {
        self.media_resource(file, "subtitles.txt")
    }

    /// Resolve a subtitle path from a descriptor against the server
    pub fn resolve(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    /// `/api/progress?file=...`
    pub fn progress(&self, file: &str) -> Result<Url> {
        let mut url = self.base.join("api/progress")?;
        url.query_pairs_mut().append_pair("file", file);
        Ok(url)
    }

    /// `/api/progress?file=...&position=...[&audio=...][&subtitle=...]`
    pub fn progress_write(&self, file: &str, record: &ProgressRecord) -> Result<Url> {
        let mut url = self.progress(file)?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in record.query_pairs() {
                query.append_pair(key, &value);
            }
        }
        Ok(url)
    }

    fn media_resource(&self, file: &str, resource: &str) -> Result<Url> {
        let segments: Vec<&str> = file.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() || segments.iter().any(|s| *s == "..") {
            return Err(Error::InvalidMediaPath(file.to_string()));
        }

        let mut url = self.base.clone();
        url.set_query(None);
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::InvalidConfig(format!("{} cannot be a base URL", self.base)))?;
            path.pop_if_empty().push("media").extend(segments).push(resource);
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints::new(Url::parse("http://media.local:8080/").unwrap()).unwrap()
    }

    #[test]
    fn test_manifest_url() {
        let url = endpoints().manifest("Movies/The Film.mkv").unwrap();
        assert_eq!(
            url.as_str(),
            "http://media.local:8080/media/Movies/The%20Film.mkv/manifest.mpd"
        );
    }

    #[test]
    fn test_manifest_url_under_prefix() {
        let e = Endpoints::new(Url::parse("http://host/player/").unwrap()).unwrap();
        assert_eq!(
            e.subtitles("a.mkv").unwrap().as_str(),
            "http://host/player/media/a.mkv/subtitles.txt"
        );
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(endpoints().manifest("../etc/passwd").is_err());
        assert!(endpoints().manifest("/").is_err());
    }

    #[test]
    fn test_progress_urls() {
        let e = endpoints();
        assert_eq!(
            e.progress("show/ep 1.mkv").unwrap().as_str(),
            "http://media.local:8080/api/progress?file=show%2Fep+1.mkv"
        );

        let record = ProgressRecord::new(42.5).with_audio("en").with_subtitle("fr");
        assert_eq!(
            e.progress_write("a.mkv", &record).unwrap().as_str(),
            "http://media.local:8080/api/progress?file=a.mkv&position=42.5&audio=en&subtitle=fr"
        );
    }
}
