#[cfg(test)]
mod tests {
    use parking_lot::{Mutex, MutexGuard};
    use std::fs;
    use taskgen::api::gemini::{GeminiConfig, API_KEY_ENV};
    use taskgen::libs::data_storage::{DataStorage, DATA_DIR_ENV};
    use taskgen::libs::secret::Secret;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

    struct SecretTestContext {
        _temp_dir: TempDir,
        _guard: MutexGuard<'static, ()>,
        test_prompt: String,
        secret_file_name: String,
    }

    impl TestContext for SecretTestContext {
        fn setup() -> Self {
            let guard = ENV_LOCK.lock();
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var(DATA_DIR_ENV, temp_dir.path());
            std::env::remove_var(API_KEY_ENV);

            SecretTestContext {
                _temp_dir: temp_dir,
                _guard: guard,
                test_prompt: "Enter test key".to_string(),
                secret_file_name: ".test_secret".to_string(),
            }
        }
    }

    #[test_context(SecretTestContext)]
    #[test]
    fn test_store_and_get_roundtrip(ctx: &mut SecretTestContext) {
        let secret = Secret::new(&ctx.secret_file_name, &ctx.test_prompt);
        secret.store("AIza-test-key").unwrap();

        assert_eq!(secret.get().as_deref(), Some("AIza-test-key"));
        assert_eq!(secret.get_or_prompt().unwrap(), "AIza-test-key");
    }

    #[test_context(SecretTestContext)]
    #[test]
    fn test_value_is_not_stored_in_plain_text(ctx: &mut SecretTestContext) {
        Secret::new(&ctx.secret_file_name, &ctx.test_prompt).store("AIza-test-key").unwrap();

        let path = DataStorage::new().get_path(&ctx.secret_file_name).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(!content.contains("AIza-test-key"));
    }

    #[test_context(SecretTestContext)]
    #[test]
    fn test_instances_share_the_file(ctx: &mut SecretTestContext) {
        Secret::new(&ctx.secret_file_name, &ctx.test_prompt).store("shared").unwrap();
        let other = Secret::new(&ctx.secret_file_name, "Different prompt");
        assert_eq!(other.get().as_deref(), Some("shared"));
    }

    #[test_context(SecretTestContext)]
    #[test]
    fn test_nonexistent_secret_file(ctx: &mut SecretTestContext) {
        assert!(Secret::new("nonexistent_secret", &ctx.test_prompt).get().is_none());
    }

    #[test_context(SecretTestContext)]
    #[test]
    fn test_corrupted_secret_file(ctx: &mut SecretTestContext) {
        let secret = Secret::new(&ctx.secret_file_name, &ctx.test_prompt);
        let path = DataStorage::new().get_path(&ctx.secret_file_name).unwrap();
        fs::write(&path, "invalid_base64_content!@#$").unwrap();

        assert!(secret.get().is_none());
    }

    #[test_context(SecretTestContext)]
    #[test]
    fn test_delete_secret(ctx: &mut SecretTestContext) {
        let secret = Secret::new(&ctx.secret_file_name, &ctx.test_prompt);
        secret.store("gone soon").unwrap();

        secret.delete().unwrap();
        secret.delete().unwrap();

        assert!(secret.get().is_none());
    }

    #[test_context(SecretTestContext)]
    #[test]
    fn test_gemini_key_prefers_environment(_ctx: &mut SecretTestContext) {
        assert!(GeminiConfig::api_key().is_none());

        std::env::set_var(API_KEY_ENV, "from-env");
        assert_eq!(GeminiConfig::api_key().as_deref(), Some("from-env"));

        std::env::set_var(API_KEY_ENV, "");
        assert!(GeminiConfig::api_key().is_none());
        std::env::remove_var(API_KEY_ENV);
    }
}
