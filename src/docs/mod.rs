/// 文档服务
pub mod google;
