//! 协议常量定义
//!
//! 出站命令与入站消息共用两个保留分隔符，协议中不存在转义机制。

/// 字段分隔符（连接命令助记符与各个顶层参数）
pub const FIELD_SEPARATOR: char = ';';

/// 列表分隔符（连接列表参数内的元素）
///
/// 注意：入站消息只使用列表分隔符作为唯一分隔符，与出站命令不对称。
/// 这是与服务端兼容的历史格式，不能单方面修改。
pub const LIST_SEPARATOR: char = ',';

/// 全部保留字符（值中出现任意一个都会破坏帧结构）
pub const RESERVED_CHARACTERS: [char; 2] = [FIELD_SEPARATOR, LIST_SEPARATOR];

/// 布尔值的线上表示
pub const BOOL_TRUE: &str = "true";
pub const BOOL_FALSE: &str = "false";

/// IMU 综合帧（`z`）携带的浮点数个数：加速度计、陀螺仪、磁力计各 3 轴
pub const IMU_BUNDLE_FIELDS: usize = 9;

/// 判断字符串是否包含保留分隔符
pub fn contains_reserved(value: &str) -> bool {
    value.contains(RESERVED_CHARACTERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators_differ() {
        assert_ne!(FIELD_SEPARATOR, LIST_SEPARATOR);
    }

    #[test]
    fn test_contains_reserved() {
        assert!(contains_reserved("left;glove"));
        assert!(contains_reserved("1,2"));
        assert!(!contains_reserved("OpenGlove-Left"));
        assert!(!contains_reserved(""));
    }
}
