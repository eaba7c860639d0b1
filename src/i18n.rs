// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和波兰文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 默认语言
pub const DEFAULT_LOCALE: &str = "en";

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"en" 或 "pl"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数，当前语言）
///
/// # 示例
/// ```no_run
/// use initiative_import::i18n::t;
/// let msg = t("import.missing_columns");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数，当前语言）
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    interpolate(rust_i18n::t!(key).to_string(), args)
}

/// 按指定语言翻译（带参数）
///
/// 导入器使用此函数：每次导入的语言来自配置，
/// 不读写全局 locale，避免并发导入互相干扰。
///
/// # 示例
/// ```no_run
/// use initiative_import::i18n::t_in;
/// let msg = t_in("pl", "import.decode_error", &[("error", "invalid utf-8")]);
/// ```
pub fn t_in(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    interpolate(rust_i18n::t!(key, locale = locale).to_string(), args)
}

fn interpolate(mut result: String, args: &[(&str, &str)]) -> String {
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // rust-i18n 的 locale 为全局状态，且 Rust 测试默认并行执行；
    // 为避免测试互相干扰，这里对修改全局 locale 的测试串行化。
    static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_set_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("pl");
        assert_eq!(current_locale(), "pl");

        set_locale(DEFAULT_LOCALE);
        assert_eq!(current_locale(), "en");
    }

    #[test]
    fn test_translate_explicit_locale() {
        let en = t_in("en", "import.missing_name", &[("header", "Nazwa")]);
        assert!(en.contains("missing required name"));
        assert!(en.contains("Nazwa"));

        let pl = t_in("pl", "import.missing_name", &[("header", "Nazwa")]);
        assert!(pl.contains("brak wymaganej nazwy"));
        assert!(pl.contains("Nazwa"));
    }

    #[test]
    fn test_translate_with_multiple_args() {
        let msg = t_in(
            "en",
            "import.tag_too_long",
            &[("tag", "edukacja"), ("max", "100")],
        );
        assert!(msg.contains("edukacja"));
        assert!(msg.contains("100"));
        assert!(!msg.contains("%{"));
    }
}
