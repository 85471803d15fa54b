use thiserror::Error;

/// The four behaviors an inbound text can route to, decided by the leading
/// command token. Anything that is not a known command is a free-text turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Add { payload: String },
    Reset,
    Chat { text: String },
}

/// Classifies by the first whitespace-delimited token. A `@botname` suffix on
/// the token (group-chat addressing) is ignored.
pub fn parse_command(text: &str) -> Command {
    let trimmed = text.trim();
    let Some(token) = trimmed.split_whitespace().next() else {
        return Command::Chat { text: String::new() };
    };
    let bare = token.split('@').next().unwrap_or(token);

    match bare {
        "/start" => Command::Start,
        "/reset" => Command::Reset,
        "/add" => {
            let payload = trimmed.strip_prefix(token).unwrap_or_default().trim().to_owned();
            Command::Add { payload }
        }
        _ => Command::Chat { text: trimmed.to_owned() },
    }
}

/// Parsed `/add` payload: `SKU | Title | Color | Size | Price [| Description]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductDraft {
    pub sku: String,
    pub title: String,
    pub color: String,
    pub size: String,
    pub price: f64,
    pub description: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum AddPayloadError {
    #[error("expected at least 5 pipe-delimited fields, got {0}")]
    TooFewFields(usize),
    #[error("price `{0}` is not a number")]
    InvalidPrice(String),
    #[error("price must not be negative")]
    NegativePrice,
}

pub fn parse_add_payload(payload: &str) -> Result<ProductDraft, AddPayloadError> {
    let parts: Vec<&str> = payload.split('|').map(str::trim).collect();
    if parts.len() < 5 {
        return Err(AddPayloadError::TooFewFields(parts.len()));
    }

    let raw_price = parts[4];
    // Decimal commas are common in hand-typed prices.
    let price: f64 = raw_price
        .replace(',', ".")
        .parse()
        .map_err(|_| AddPayloadError::InvalidPrice(raw_price.to_owned()))?;
    if price < 0.0 {
        return Err(AddPayloadError::NegativePrice);
    }

    Ok(ProductDraft {
        sku: parts[0].to_owned(),
        title: parts[1].to_owned(),
        color: parts[2].to_owned(),
        size: parts[3].to_owned(),
        price,
        description: parts.get(5).copied().unwrap_or_default().to_owned(),
    })
}
