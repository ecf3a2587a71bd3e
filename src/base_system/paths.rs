//! 文件名清洗。

const RESERVED: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// 把作品标题、用户名之类的文本变成可以安全放进单个路径段的名字。
///
/// Windows 禁用字符换成全角等价字符，控制字符换成 `replacement`，
/// 结尾的空格和点去掉，保留设备名加前缀，超长按字符边界截断。
pub fn safe_fs_name(name: &str, replacement: &str, max_len: usize) -> String {
    let fallback = replacement.chars().next().unwrap_or('_');
    let mut cleaned: String = name
        .chars()
        .map(|ch| match ch {
            ':' => '：',
            '"' => '＂',
            '<' => '《',
            '>' => '》',
            '/' | '\\' => '、',
            '|' => '｜',
            '?' => '？',
            '*' => '＊',
            c if c.is_control() => fallback,
            c => c,
        })
        .collect();

    trim_tail(&mut cleaned);

    if RESERVED.contains(&cleaned.to_uppercase().as_str()) {
        cleaned.insert(0, '_');
    }

    if cleaned.len() > max_len {
        // 不能切在多字节字符中间
        let mut end = max_len;
        while end > 0 && !cleaned.is_char_boundary(end) {
            end -= 1;
        }
        cleaned.truncate(end);
        trim_tail(&mut cleaned);
    }

    if cleaned.is_empty() {
        cleaned.push_str("unnamed");
    }
    cleaned
}

fn trim_tail(s: &mut String) {
    while s.ends_with(' ') || s.ends_with('.') {
        s.pop();
    }
}
