//! 坐标参数化
//!
//! 在检查声明的经纬度区间内随机取点，替换URL和描述模板中的
//! `{lat}` / `{lon}` 占位符

use crate::config::{CheckConfig, CoordinatePolicy, HostConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// 经纬度坐标，均已保留两位小数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// 纬度
    pub lat: f64,
    /// 经度
    pub lon: f64,
}

/// 实例化后的检查，模板已替换为具体值
#[derive(Debug, Clone)]
pub struct InstantiatedCheck<'a> {
    /// 所属主机
    pub host: &'a str,
    /// 原始检查配置
    pub config: &'a CheckConfig,
    /// 实际URL
    pub url: String,
    /// 实际描述
    pub description: String,
    /// 采样坐标（如果有）
    pub coordinate: Option<Coordinate>,
}

impl InstantiatedCheck<'_> {
    /// 上报列名
    pub fn column(&self) -> &str {
        &self.config.column
    }
}

/// 坐标缓存键：主机加上两个区间，区间不同的检查各自取点
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PointKey {
    host: String,
    lat_range: [u64; 2],
    lon_range: [u64; 2],
}

impl PointKey {
    fn new(host: &str, lat_range: [f64; 2], lon_range: [f64; 2]) -> Self {
        Self {
            host: host.to_string(),
            lat_range: lat_range.map(f64::to_bits),
            lon_range: lon_range.map(f64::to_bits),
        }
    }
}

/// 单次运行的上下文，持有随机数生成器和按主机缓存的坐标
pub struct RunContext {
    rng: StdRng,
    points: HashMap<PointKey, Coordinate>,
}

impl RunContext {
    /// 使用系统熵创建上下文
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// 使用固定种子创建上下文
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            points: HashMap::new(),
        }
    }

    /// 已缓存的主机坐标
    pub fn cached_point(
        &self,
        host: &str,
        lat_range: [f64; 2],
        lon_range: [f64; 2],
    ) -> Option<Coordinate> {
        self.points
            .get(&PointKey::new(host, lat_range, lon_range))
            .copied()
    }

    /// 实例化检查
    ///
    /// 任一区间缺失时原样返回；否则按主机的采样策略取点并替换占位符。
    /// `per_host` 策略下同一主机、同一对区间的检查共用一个点
    pub fn instantiate<'a>(
        &mut self,
        host: &'a HostConfig,
        check: &'a CheckConfig,
    ) -> InstantiatedCheck<'a> {
        let coordinate = match (check.lat_range, check.lon_range) {
            (Some(lat_range), Some(lon_range)) => Some(match host.coordinate_policy {
                CoordinatePolicy::PerCheck => self.sample(lat_range, lon_range),
                CoordinatePolicy::PerHost => {
                    let key = PointKey::new(&host.name, lat_range, lon_range);
                    match self.points.get(&key) {
                        Some(point) => *point,
                        None => {
                            let point = self.sample(lat_range, lon_range);
                            self.points.insert(key, point);
                            point
                        }
                    }
                }
            }),
            _ => None,
        };

        let (url, description) = match coordinate {
            Some(point) => (
                substitute(&check.url, point),
                substitute(&check.description, point),
            ),
            None => (check.url.clone(), check.description.clone()),
        };

        InstantiatedCheck {
            host: &host.name,
            config: check,
            url,
            description,
            coordinate,
        }
    }

    fn sample(&mut self, lat_range: [f64; 2], lon_range: [f64; 2]) -> Coordinate {
        let lat = self.rng.gen_range(lat_range[0]..=lat_range[1]);
        let lon = self.rng.gen_range(lon_range[0]..=lon_range[1]);
        Coordinate {
            lat: round_within(lat, lat_range),
            lon: round_within(lon, lon_range),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// 区间内两位小数取值的上下界，区间内不存在两位小数时返回 `None`
pub fn two_decimal_bounds([min, max]: [f64; 2]) -> Option<(f64, f64)> {
    let low = (min * 100.0 - 1e-6).ceil() / 100.0;
    let high = (max * 100.0 + 1e-6).floor() / 100.0;
    (low <= high).then_some((low, high))
}

/// 保留两位小数，且结果不越出区间
///
/// 区间内没有两位小数的值时只做舍入；检查表验证会拒绝这种区间
fn round_within(value: f64, range: [f64; 2]) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    match two_decimal_bounds(range) {
        Some((low, high)) => rounded.clamp(low, high),
        None => rounded,
    }
}

fn substitute(template: &str, point: Coordinate) -> String {
    template
        .replace("{lat}", &format!("{:.2}", point.lat))
        .replace("{lon}", &format!("{:.2}", point.lon))
}
