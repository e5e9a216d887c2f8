use darling::FromAttributes;
use syn::DeriveInput;

/// Parsed attributes from #[extn(...)]
#[derive(Debug, FromAttributes)]
#[darling(attributes(extn))]
pub struct ExtnArgs {
    /// Feature name, also the flag name looked up in `FeatureFlags`
    pub name: String,

    /// Comma separated list of exact parameter keys owned by the feature
    #[darling(default)]
    pub keys: Option<String>,

    /// Comma separated list of key prefixes owned by the feature
    #[darling(default)]
    pub prefixes: Option<String>,
}

pub fn parse_extn_args(input: &DeriveInput) -> darling::Result<ExtnArgs> {
    ExtnArgs::from_attributes(&input.attrs)
}

/// Split a comma separated attribute value, dropping empty entries
pub fn split_list(list: Option<&String>) -> Vec<String> {
    list.map(|s| {
        s.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
