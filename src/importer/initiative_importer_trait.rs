// ==========================================
// 倡议追踪系统 - 倡议导入 Trait
// ==========================================
// 职责: 定义倡议导入接口（不包含实现）
// ==========================================

use crate::domain::initiative::ImportOutcome;
use std::path::Path;

// ==========================================
// InitiativeImporter Trait
// ==========================================
// 用途: 倡议批量导入主接口
// 实现者: InitiativeImporterImpl
//
// 两个入口都不返回 Err：致命错误写入 ImportOutcome.fatal_errors，
// 此时 imported == 0 且本次导入未留下任何持久化效果。
pub trait InitiativeImporter: Send + Sync {
    /// 从文件导入
    ///
    /// # 参数
    /// - path: .csv 或 .xlsx 文件（扩展名不区分大小写）
    ///
    /// # 说明
    /// - 先按扩展名识别格式，不支持的格式不会读取文件内容
    fn import_file(&self, path: &Path) -> ImportOutcome;

    /// 从内存字节导入
    ///
    /// # 参数
    /// - file_name: 仅用于识别格式
    /// - bytes: 文件完整内容
    ///
    /// # 导入流程
    /// 1. 解码表头与数据行
    /// 2. 表头校验（缺列即致命错误）
    /// 3. 逐行: 名称校验 → 字段转换/标签解析 → 保存点内落库
    /// 4. 全部行处理完毕后提交外层事务
    fn import_bytes(&self, file_name: &str, bytes: Vec<u8>) -> ImportOutcome;
}
