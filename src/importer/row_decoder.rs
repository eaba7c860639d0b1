// ==========================================
// 倡议追踪系统 - 行解码器
// ==========================================
// 支持: CSV (.csv) / Excel (.xlsx，仅第一个工作表)
// 输出: 表头 + 惰性数据行序列（每行为有序单元格字符串）
// ==========================================

use crate::domain::types::FileFormat;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{Data, Range, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use csv::{ReaderBuilder, StringRecordsIntoIter};
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// 原始行（0 起始，可能短于表头）
pub type RawRow = Vec<String>;

// ==========================================
// RowSource - 统一的“带表头行序列”接口
// ==========================================
// 惰性、有限、不可重启；解码失败以 Err 项给出，调用方视为致命错误
pub trait RowSource: Iterator<Item = ImportResult<RawRow>> + Send {
    /// 表头行（单元格已去除首尾空白）
    fn header(&self) -> &[String];

    fn format(&self) -> FileFormat;
}

/// 根据文件名选择解码器
///
/// # 返回
/// - Err(UnsupportedFormat): 扩展名不受支持（未读取任何内容）
/// - Err(Decode): 表头/工作簿无法解析
pub fn open_row_source(
    file_name: &str,
    bytes: Vec<u8>,
    csv_delimiter: u8,
) -> ImportResult<Box<dyn RowSource>> {
    let format = detect_format(file_name)?;

    match format {
        FileFormat::Csv => Ok(Box::new(CsvRowDecoder::new(
            Cursor::new(bytes),
            csv_delimiter,
        )?)),
        FileFormat::Xlsx => Ok(Box::new(SheetRowDecoder::from_workbook(Cursor::new(
            bytes,
        ))?)),
    }
}

/// 识别文件格式
pub fn detect_format(file_name: &str) -> ImportResult<FileFormat> {
    FileFormat::from_file_name(file_name).ok_or_else(|| {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| file_name.to_string());
        ImportError::UnsupportedFormat(ext)
    })
}

// ==========================================
// CSV 解码器
// ==========================================
pub struct CsvRowDecoder<R: Read> {
    header: Vec<String>,
    records: StringRecordsIntoIter<R>,
}

impl<R: Read> CsvRowDecoder<R> {
    /// 读取表头并准备逐行读取
    ///
    /// # 参数
    /// - reader: UTF-8 文本源
    /// - delimiter: 分隔符（标准双引号转义）
    pub fn new(reader: R, delimiter: u8) -> ImportResult<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter)
            .from_reader(reader);

        let header = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        Ok(Self {
            header,
            records: reader.into_records(),
        })
    }
}

impl<R: Read> Iterator for CsvRowDecoder<R> {
    type Item = ImportResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next().map(|result| {
            result
                .map(|record| record.iter().map(str::to_string).collect())
                .map_err(ImportError::from)
        })
    }
}

impl<R: Read + Send> RowSource for CsvRowDecoder<R> {
    fn header(&self) -> &[String] {
        &self.header
    }

    fn format(&self) -> FileFormat {
        FileFormat::Csv
    }
}

// ==========================================
// Excel 解码器
// ==========================================
// 缺失单元格补空串：每行恰好输出工作表列宽个值
pub struct SheetRowDecoder {
    header: Vec<String>,
    range: Range<Data>,
    next_row: usize,
}

impl SheetRowDecoder {
    /// 打开工作簿并读取第一个工作表
    pub fn from_workbook<RS: Read + Seek>(reader: RS) -> ImportResult<Self> {
        let mut workbook: Xlsx<RS> = Xlsx::new(reader)?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::Decode("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;
        Ok(Self::from_range(range))
    }

    /// 从已加载的单元格区域构造（第一行为表头）
    pub fn from_range(range: Range<Data>) -> Self {
        let header = if range.height() > 0 {
            row_values(&range, 0)
                .into_iter()
                .map(|h| h.trim().to_string())
                .collect()
        } else {
            Vec::new()
        };

        Self {
            header,
            range,
            next_row: 1,
        }
    }
}

fn row_values(range: &Range<Data>, row: usize) -> RawRow {
    (0..range.width())
        .map(|col| range.get((row, col)).map(cell_text).unwrap_or_default())
        .collect()
}

/// 单元格 → 文本
///
/// 日期单元格输出 `YYYY-MM-DD HH:MM:SS`（有微秒时附加 6 位小数），
/// 其余类型沿用 calamine 的 Display（2024.0 → "2024"）。
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::DateTime(dt) if !dt.is_duration() => dt
            .as_datetime()
            .map(format_datetime)
            .unwrap_or_else(|| cell.to_string()),
        Data::DateTimeIso(iso) => NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(iso, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .map(format_datetime)
            .unwrap_or_else(|| iso.clone()),
        _ => cell.to_string(),
    }
}

fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.nanosecond() / 1_000 == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

impl Iterator for SheetRowDecoder {
    type Item = ImportResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_row >= self.range.height() {
            return None;
        }

        let values = row_values(&self.range, self.next_row);
        self.next_row += 1;
        Some(Ok(values))
    }
}

impl RowSource for SheetRowDecoder {
    fn header(&self) -> &[String] {
        &self.header
    }

    fn format(&self) -> FileFormat {
        FileFormat::Xlsx
    }
}
