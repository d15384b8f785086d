use serde::{Deserialize, Serialize};

/// The subset of TMDb movie fields the board reads and stores.
///
/// Stored inline with each recommendation, so it deliberately carries only what
/// ranking and display need. Unknown upstream fields are dropped on decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

impl MovieSummary {
    /// Release year taken from a `YYYY-MM-DD` date, if present
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .filter(|date| !date.is_empty())
            .and_then(|date| date.split('-').next())
    }
}

/// One page of a TMDb movie listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MoviePage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<MovieSummary>,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub total_pages: u32,
}

impl MoviePage {
    /// The value returned when the catalog is unreachable
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A video attached to a movie (trailers, teasers, clips)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

impl Video {
    pub fn is_youtube_trailer(&self) -> bool {
        self.video_type == "Trailer" && self.site == "YouTube"
    }
}

/// Raw response from `/movie/{id}/videos`
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

impl VideoList {
    pub fn first_trailer(&self) -> Option<&Video> {
        self.results.iter().find(|v| v.is_youtube_trailer())
    }
}

/// A playable trailer, resolved to an embeddable URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trailer {
    pub key: String,
    pub name: String,
    pub embed_url: String,
}

impl From<Video> for Trailer {
    fn from(video: Video) -> Self {
        let embed_url = youtube_embed_url(&video.key);
        Trailer {
            key: video.key,
            name: video.name,
            embed_url,
        }
    }
}

/// Muted autoplay embed without related videos or branding
pub fn youtube_embed_url(video_key: &str) -> String {
    format!(
        "https://www.youtube.com/embed/{}?autoplay=1&mute=1&controls=0&modestbranding=1&rel=0&showinfo=0",
        video_key
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

/// Full movie record from `/movie/{id}?append_to_response=videos,credits`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub summary: MovieSummary,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub videos: VideoList,
    #[serde(default)]
    pub credits: Credits,
}
