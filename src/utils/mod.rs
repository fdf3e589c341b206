pub mod http_client;

/// 日志中显示 Token 的安全形式：`abcde...wxyz`
///
/// 过短的值整体隐藏
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("ya29.a0AfB_byC123456789"), "ya29....6789");
        assert_eq!(mask_secret("short"), "***");
        assert_eq!(mask_secret(""), "***");
        // 多字节字符不应 panic
        assert_eq!(mask_secret("令牌令牌令牌令牌令牌令牌令牌"), "令牌令牌令...令牌令牌");
    }
}
