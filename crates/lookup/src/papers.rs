//! PaperContactLookup - research paper to author contacts

use tracing::{debug, instrument};

use contracts::{AuthorContact, Lookup, LookupError, WorkItem};

use crate::client::{ResponsesClient, ResponsesRequest, JSON_ONLY_SUFFIX};
use crate::decode::{decode_authors, RawAuthor};

const INSTRUCTIONS: &str = r#"You are an expert at researching people's contact information from academic papers.
Extract ALL authors from the paper and return them in a specific JSON format.
For ALL authors, include their name and nationality.
For authors from Europe or the United Kingdom ONLY, also find their LinkedIn and email contact information.
For non-European/UK authors, set linkedin and email to "Not found".

Return a JSON object with a single key "authors" containing an array of author objects.
Each author object must have exactly these fields:
- name: string (author's full name)
- nationality: string (author's nationality)
- linkedin: string (LinkedIn URL for EU/UK authors, "Not found" for others)
- email: string (email address for EU/UK authors, "Not found" for others)
- notes: string (any additional relevant information)"#;

const UNKNOWN: &str = "Unknown";
const NOT_FOUND: &str = "Not found";

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Typed contact with defaults for missing fields and the paper link attached
pub fn into_contact(raw: RawAuthor, paper_link: &str) -> AuthorContact {
    AuthorContact {
        name: or_default(raw.name, UNKNOWN),
        nationality: or_default(raw.nationality, UNKNOWN),
        linkedin: or_default(raw.linkedin, NOT_FOUND),
        email: or_default(raw.email, NOT_FOUND),
        paper_link: paper_link.to_string(),
        notes: or_default(raw.notes, ""),
    }
}

/// Author extraction via the Responses API
///
/// `item.identifier` is the paper link, `item.label()` the paper title.
pub struct PaperContactLookup<C> {
    client: C,
    model: String,
}

impl<C: ResponsesClient> PaperContactLookup<C> {
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn request(&self, item: &WorkItem) -> ResponsesRequest {
        let input = format!(
            "For the following paper, extract information for ALL authors:\n\
             Paper: {}\n\
             Link: {}\n\n\
             List ALL authors from the paper. Only research contact information (LinkedIn, email) \
             for those from Europe or the United Kingdom.{}",
            item.label(),
            item.identifier,
            JSON_ONLY_SUFFIX
        );
        ResponsesRequest {
            model: self.model.clone(),
            instructions: INSTRUCTIONS.to_string(),
            input,
        }
    }
}

impl<C: ResponsesClient> Lookup for PaperContactLookup<C> {
    type Record = AuthorContact;

    fn name(&self) -> &str {
        "paper_contacts"
    }

    #[instrument(
        name = "paper_lookup",
        skip(self, item),
        fields(item = item.index, link = %item.identifier)
    )]
    async fn lookup(&self, item: &WorkItem) -> Result<Vec<AuthorContact>, LookupError> {
        let text = self.client.respond(&self.request(item)).await?;
        let authors: Vec<_> = decode_authors(&text)?
            .into_iter()
            .map(|raw| into_contact(raw, &item.identifier))
            .collect();
        debug!(authors = authors.len(), "Authors decoded");
        Ok(authors)
    }

    fn synthetic(&self, item: &WorkItem) -> Vec<AuthorContact> {
        synthetic_contacts(item)
    }
}

/// Fixed dry-run author
pub fn synthetic_contacts(item: &WorkItem) -> Vec<AuthorContact> {
    vec![AuthorContact {
        name: "Dr. Example Author".into(),
        nationality: "United Kingdom".into(),
        linkedin: "https://linkedin.com/in/example".into(),
        email: "example@university.edu".into(),
        paper_link: item.identifier.clone(),
        notes: "Mock data for dry run".into(),
    }]
}
