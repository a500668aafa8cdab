//! 核心宏定义
//!
//! 提供统一的宏来减少代码重复

/// 为结构体实现Default trait的宏
///
/// 使用示例:
/// ```rust
/// use particle_field::impl_default;
///
/// struct SurfaceSize {
///     width: u32,
///     height: u32,
/// }
///
/// impl_default!(SurfaceSize {
///     width: 800,
///     height: 600,
/// });
///
/// assert_eq!(SurfaceSize::default().width, 800);
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}
