//! Mock inventory used by the dashboard commands.

use std::fmt;

use retail_flows::{DemandForecastInput, DynamicPricerInput, ReturnRouterInput};
use retail_primitives::ImageDataUri;

/// Where an item is stocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    Store,
    Warehouse,
}

#[derive(Debug)]
pub struct Location {
    pub kind: LocationKind,
    pub name: &'static str,
    pub zip_code: &'static str,
}

/// Narrative market signals collected per item.
#[derive(Debug)]
pub struct MarketData {
    pub historical_sales_data: &'static str,
    pub social_media_trends: &'static str,
    pub local_event_data: &'static str,
    pub competitor_prices: &'static str,
    pub market_trends: &'static str,
    pub local_demand: &'static str,
    pub cost_effectiveness_factors: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    New,
    UsedLikeNew,
    UsedGood,
    Damaged,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::New => "New",
            Self::UsedLikeNew => "Used - Like New",
            Self::UsedGood => "Used - Good",
            Self::Damaged => "Damaged",
        })
    }
}

#[derive(Debug)]
pub struct ReturnInfo {
    pub return_reason: &'static str,
    pub condition: Condition,
}

#[derive(Debug)]
pub struct InventoryItem {
    pub sku: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub stock: u32,
    pub cost: f64,
    pub original_price: f64,
    pub location: Location,
    pub market: MarketData,
    pub return_info: Option<ReturnInfo>,
}

impl InventoryItem {
    /// Return-routing input for items with an open return.
    pub fn return_input(&self, photo: Option<ImageDataUri>) -> Option<ReturnRouterInput> {
        let info = self.return_info.as_ref()?;
        Some(ReturnRouterInput {
            product_description: format!(
                "{} {} Condition: {}.",
                self.name, self.description, info.condition
            ),
            original_price: self.original_price,
            return_reason: info.return_reason.to_owned(),
            local_demand: self.market.local_demand.to_owned(),
            cost_effectiveness_factors: self.market.cost_effectiveness_factors.to_owned(),
            photo_data_uri: photo,
        })
    }
}

impl From<&InventoryItem> for DemandForecastInput {
    fn from(item: &InventoryItem) -> Self {
        Self {
            product_name: item.name.to_owned(),
            zip_code: item.location.zip_code.to_owned(),
            historical_sales_data: item.market.historical_sales_data.to_owned(),
            social_media_trends: item.market.social_media_trends.to_owned(),
            local_event_data: item.market.local_event_data.to_owned(),
        }
    }
}

impl From<&InventoryItem> for DynamicPricerInput {
    fn from(item: &InventoryItem) -> Self {
        Self {
            product_description: format!("{}: {}", item.name, item.description),
            cost: item.cost,
            original_price: item.original_price,
            competitor_prices: item.market.competitor_prices.to_owned(),
            market_trends: item.market.market_trends.to_owned(),
        }
    }
}

/// Looks an item up by SKU, ignoring case.
pub fn find(sku: &str) -> Option<&'static InventoryItem> {
    CATALOG.iter().find(|item| item.sku.eq_ignore_ascii_case(sku))
}

pub fn catalog() -> &'static [InventoryItem] {
    &CATALOG
}

static CATALOG: [InventoryItem; 5] = [
    InventoryItem {
        sku: "CK-CBT-001",
        name: "Premium Cricket Bat",
        description: "English Willow Grade 1 cricket bat, perfect for professional players and enthusiasts.",
        category: "Sports",
        stock: 120,
        cost: 8000.0,
        original_price: 14999.0,
        location: Location {
            kind: LocationKind::Store,
            name: "Store #2021 (Mumbai)",
            zip_code: "400050",
        },
        market: MarketData {
            historical_sales_data: "Averaging 20 units per week. Spike in sales during IPL and World Cup seasons.",
            social_media_trends: "High engagement on cricket fan pages and mentions by local sports influencers.",
            local_event_data: "Upcoming local cricket tournament in the area is expected to boost sales.",
            competitor_prices: "Similar models from SG and SS are priced between ₹12,000 and ₹16,000.",
            market_trends: "Increased demand for high-quality sports equipment post-pandemic.",
            local_demand: "Steady demand from cricket academies and young professionals in Mumbai.",
            cost_effectiveness_factors: "Low shipping costs from the main warehouse. High-value item with good resale potential.",
        },
        return_info: None,
    },
    InventoryItem {
        sku: "KT-AFRY-002",
        name: "Air Fryer XL",
        description: "A 5.5-litre extra-large air fryer, perfect for family meals. Features a digital touchscreen with 11 presets.",
        category: "Home Goods",
        stock: 75,
        cost: 4500.0,
        original_price: 8999.0,
        location: Location {
            kind: LocationKind::Store,
            name: "Store #1080 (Bangalore)",
            zip_code: "560001",
        },
        market: MarketData {
            historical_sales_data: "Sales have been increasing steadily over the past 6 months, popular in metro cities.",
            social_media_trends: "Trending in healthy eating and quick meal prep communities on Instagram and YouTube India.",
            local_event_data: "Local food and wellness festivals could increase interest in cooking appliances.",
            competitor_prices: "Competitor models from Philips and Havells range from ₹8,000 to ₹10,000.",
            market_trends: "Growing market for convenient kitchen appliances in urban India.",
            local_demand: "Popular among working professionals and health-conscious consumers in Bangalore.",
            cost_effectiveness_factors: "Medium-sized item, efficient to ship. Returns are often in good condition.",
        },
        return_info: None,
    },
    InventoryItem {
        sku: "TV-SMRT-003",
        name: "43-inch 4K Smart TV",
        description: "A 43-inch 4K Smart TV, model XYZ. Minor cosmetic scratches on the bezel. Powers on and functions correctly.",
        category: "Electronics",
        stock: 1,
        cost: 18000.0,
        original_price: 35999.0,
        location: Location {
            kind: LocationKind::Warehouse,
            name: "Delhi Returns Center",
            zip_code: "110001",
        },
        market: MarketData {
            historical_sales_data: "High sales volume, especially during Diwali and major online sale events.",
            social_media_trends: "Frequently discussed during new movie releases on OTT platforms and major cricket matches.",
            local_event_data: "N/A",
            competitor_prices: "OnePlus and Xiaomi models with similar specs are priced around ₹32,000-₹38,000.",
            market_trends: "Constant demand for larger screen sizes and smart features in the Indian market.",
            local_demand: "High demand for used electronics in good condition in this area.",
            cost_effectiveness_factors: "Low logistics cost to a nearby resale partner. Warehousing space is available.",
        },
        return_info: Some(ReturnInfo {
            return_reason: "Customer upgraded to a larger model during the return period.",
            condition: Condition::UsedLikeNew,
        }),
    },
    InventoryItem {
        sku: "FD-BRIC-004",
        name: "Basmati Rice (5kg)",
        description: "Premium quality long-grain Basmati rice, 5kg pack. Ideal for biryani and pulao.",
        category: "Groceries",
        stock: 800,
        cost: 450.0,
        original_price: 699.0,
        location: Location {
            kind: LocationKind::Warehouse,
            name: "Warehouse-Punjab-02",
            zip_code: "141001",
        },
        market: MarketData {
            historical_sales_data: "Consistent repeat purchases. Sales spike during festival seasons like Diwali and Eid.",
            social_media_trends: "Popular in food blogger channels and regional cuisine recipe groups.",
            local_event_data: "Increased demand expected around the wedding season in Hyderabad.",
            competitor_prices: "Brands like India Gate and Daawat are priced similarly per kg.",
            market_trends: "Strong consumer preference for branded and high-quality staple foods.",
            local_demand: "High consumption of Basmati rice in the target Hyderabad region.",
            cost_effectiveness_factors: "Good shelf life, efficient to ship in bulk. Low return rate.",
        },
        return_info: None,
    },
    InventoryItem {
        sku: "GM-LPTP-005",
        name: "Gaming Laptop 15\"",
        description: "High-performance gaming laptop with 15\" 144Hz display, RTX 3060 GPU, and 16GB RAM.",
        category: "Electronics",
        stock: 30,
        cost: 75000.0,
        original_price: 110_000.0,
        location: Location {
            kind: LocationKind::Warehouse,
            name: "Warehouse-Delhi-01",
            zip_code: "110001",
        },
        market: MarketData {
            historical_sales_data: "High sales during new game releases and festive sales like the Big Billion Days.",
            social_media_trends: "Often featured in 'Top Gaming Laptops' lists by Indian tech YouTubers.",
            local_event_data: "Major gaming expos in Delhi and Mumbai could drive sales.",
            competitor_prices: "ASUS and HP models offer similar performance at a 5-10% higher price point.",
            market_trends: "The market for e-sports and high-end gaming hardware is expanding rapidly in India.",
            local_demand: "Popular with a younger demographic and e-sports enthusiasts in Mumbai and Bangalore.",
            cost_effectiveness_factors: "High-value item, requires secure shipping. Returns are infrequent but costly.",
        },
        return_info: None,
    },
];
