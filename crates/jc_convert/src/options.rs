/// Settings shared by the converters that delegate to a concrete type's own
/// field mapping ([`InterfaceConverter`] and [`PolymorphicConverter`]).
///
/// Enum label matching is always exact and ignores these settings.
///
/// # Examples
///
/// ```
/// use jc_convert::ConvertOptions;
///
/// let options = ConvertOptions::new().with_property_name_case_insensitive(true);
/// assert!(options.property_name_case_insensitive);
/// assert!(!ConvertOptions::default().property_name_case_insensitive);
/// ```
///
/// [`InterfaceConverter`]: crate::InterfaceConverter
/// [`PolymorphicConverter`]: crate::PolymorphicConverter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Match object keys to field names ignoring case, for the concrete type
    /// and every struct nested in it.
    ///
    /// A key that matches a field exactly is always kept as is. Maps,
    /// `#[serde(flatten)]` fields, untagged or internally tagged enums and
    /// variant names are still matched exactly.
    pub property_name_case_insensitive: bool,
}

impl ConvertOptions {
    /// Exact field matching.
    #[inline]
    pub const fn new() -> Self {
        Self {
            property_name_case_insensitive: false,
        }
    }

    #[inline]
    pub const fn with_property_name_case_insensitive(mut self, enabled: bool) -> Self {
        self.property_name_case_insensitive = enabled;
        self
    }
}
