//! Names shared by the processor, the session store and the HTTP layer.

/// Component the submissions belong to; also the ACL asset name.
pub const COMPONENT: &str = "com_helloworld";

/// Edit context of the add-greeting form.
pub const EDIT_CONTEXT: &str = "helloworld";

/// ACL action checked before anything else happens.
pub const CREATE_ACTION: &str = "core.create";

/// Submitter label used in notifications for anonymous visitors.
pub const ANONYMOUS_SUBMITTER: &str = "a visitor to the site";

/// Validation errors shown to the visitor; the rest are only counted.
pub const MAX_VALIDATION_MESSAGES: usize = 3;

/// Directory under the media root that receives uploaded images.
pub const DEFAULT_IMAGE_PATH: &str = "images";

/// Session key that receives flash messages between requests.
pub const FLASH_MESSAGES_KEY: &str = "application.queue";

/// Session key holding the last rejected form data: `{component}.edit.{context}.data`.
pub fn edit_data_key(component: &str, context: &str) -> String {
    format!("{}.edit.{}.data", component, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_data_key_format() {
        assert_eq!(
            edit_data_key(COMPONENT, EDIT_CONTEXT),
            "com_helloworld.edit.helloworld.data"
        );
    }
}
