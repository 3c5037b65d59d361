//! Mock data the store starts from.
//!
//! Timestamps are relative to the `now` passed in, so a freshly seeded store
//! always has orders from "today" and coupons that are currently valid.

use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::Decimal;
use ttd_core::address::Address;
use ttd_core::catalog::{Category, Product, Specification, Subcategory, discount_percent, slugify};
use ttd_core::coupon::{Coupon, CouponKind};
use ttd_core::order::{Order, OrderItem, estimated_delivery};
use ttd_core::pricing::PricingPolicy;
use ttd_core::user::{CardBrand, NotificationPreferences, SavedCard, SavedUpi, User};
use ttd_core::{
    AddressId, AddressType, CategoryId, CustomerStatus, Email, OrderId, OrderStatus,
    PaymentMethod, PaymentStatus, Price, ProductId, SavedPaymentId, UserId, UserRole,
};

use crate::data::{StoreData, StoreSettings};

/// Shared by every seeded product until real photography exists.
pub const PLACEHOLDER_IMAGE: &str = "/static/images/placeholder.svg";

/// Email of the seeded back-office account.
pub const ADMIN_EMAIL: &str = "admin@ttdsoftware.in";

/// Email of the seeded demo customer.
pub const DEMO_EMAIL: &str = "demo@ttdsoftware.in";

const CATEGORIES: &[(&str, &[&str])] = &[
    ("Electronics", &["Smartphones", "Laptops", "Audio", "Wearables"]),
    ("Fashion", &["Men's Clothing", "Women's Clothing", "Footwear"]),
    ("Home & Kitchen", &["Appliances", "Cookware", "Home Decor"]),
    ("Books", &["Fiction", "Non-Fiction"]),
    ("Beauty & Personal Care", &["Skincare", "Grooming"]),
    ("Sports & Fitness", &["Fitness Equipment", "Outdoor"]),
];

struct SeedProduct {
    name: &'static str,
    brand: &'static str,
    category: &'static str,
    subcategory: &'static str,
    price: i64,
    original_price: i64,
    stock: u32,
    rating: f32,
    reviews: u32,
    tags: &'static [&'static str],
    age_days: i64,
    description: &'static str,
    specs: &'static [(&'static str, &'static str)],
    features: &'static [&'static str],
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Samsung Galaxy M34 5G",
        brand: "Samsung",
        category: "Electronics",
        subcategory: "Smartphones",
        price: 16_999,
        original_price: 24_999,
        stock: 45,
        rating: 4.3,
        reviews: 12_850,
        tags: &["bestseller", "5g"],
        age_days: 120,
        description: "6000 mAh battery, 120Hz sAMOLED display and a 50MP triple camera.",
        specs: &[("Display", "6.5\" sAMOLED 120Hz"), ("Battery", "6000 mAh"), ("RAM", "6 GB")],
        features: &["5G ready", "Nightography camera", "4 years of security updates"],
    },
    SeedProduct {
        name: "Redmi Note 13 Pro",
        brand: "Xiaomi",
        category: "Electronics",
        subcategory: "Smartphones",
        price: 23_999,
        original_price: 28_999,
        stock: 8,
        rating: 4.2,
        reviews: 9_640,
        tags: &["new", "5g"],
        age_days: 10,
        description: "200MP camera with OIS and a 1.5K curved AMOLED display.",
        specs: &[("Display", "6.67\" AMOLED"), ("Camera", "200MP"), ("Charging", "67W")],
        features: &["IP54 splash resistance", "Dolby Atmos speakers"],
    },
    SeedProduct {
        name: "HP Pavilion 15 Laptop",
        brand: "HP",
        category: "Electronics",
        subcategory: "Laptops",
        price: 62_990,
        original_price: 78_999,
        stock: 12,
        rating: 4.4,
        reviews: 2_315,
        tags: &["bestseller"],
        age_days: 200,
        description: "Intel Core i5 13th gen, 16 GB RAM and 512 GB SSD in a slim aluminium body.",
        specs: &[("Processor", "Intel Core i5-1335U"), ("RAM", "16 GB DDR4"), ("Storage", "512 GB SSD")],
        features: &["Backlit keyboard", "Fast charge 50% in 45 minutes"],
    },
    SeedProduct {
        name: "Lenovo IdeaPad Slim 3",
        brand: "Lenovo",
        category: "Electronics",
        subcategory: "Laptops",
        price: 41_990,
        original_price: 59_990,
        stock: 0,
        rating: 4.1,
        reviews: 1_876,
        tags: &[],
        age_days: 260,
        description: "AMD Ryzen 5 laptop for everyday work with a full HD anti-glare screen.",
        specs: &[("Processor", "AMD Ryzen 5 7520U"), ("RAM", "8 GB"), ("Weight", "1.6 kg")],
        features: &["Privacy shutter", "Rapid charge"],
    },
    SeedProduct {
        name: "boAt Airdopes 141",
        brand: "boAt",
        category: "Electronics",
        subcategory: "Audio",
        price: 1_299,
        original_price: 4_490,
        stock: 230,
        rating: 4.1,
        reviews: 45_120,
        tags: &["bestseller", "deal"],
        age_days: 300,
        description: "True wireless earbuds with 42 hours of playback and low-latency mode.",
        specs: &[("Playback", "42 hours"), ("Bluetooth", "5.1"), ("Water resistance", "IPX4")],
        features: &["ENx noise cancellation for calls", "ASAP fast charge"],
    },
    SeedProduct {
        name: "Sony WH-1000XM5",
        brand: "Sony",
        category: "Electronics",
        subcategory: "Audio",
        price: 26_990,
        original_price: 34_990,
        stock: 18,
        rating: 4.7,
        reviews: 3_204,
        tags: &["premium"],
        age_days: 90,
        description: "Industry-leading noise cancelling headphones with 30 hours of battery.",
        specs: &[("Battery", "30 hours"), ("Driver", "30 mm"), ("Weight", "250 g")],
        features: &["Auto noise cancelling optimiser", "Multipoint connection"],
    },
    SeedProduct {
        name: "Noise ColorFit Pro 5",
        brand: "Noise",
        category: "Electronics",
        subcategory: "Wearables",
        price: 3_499,
        original_price: 8_999,
        stock: 75,
        rating: 4.0,
        reviews: 7_820,
        tags: &["deal"],
        age_days: 45,
        description: "1.85\" AMOLED smartwatch with Bluetooth calling and 100+ sports modes.",
        specs: &[("Display", "1.85\" AMOLED"), ("Battery", "7 days")],
        features: &["Bluetooth calling", "SpO2 and heart rate monitoring"],
    },
    SeedProduct {
        name: "Levi's Men's 511 Slim Jeans",
        brand: "Levi's",
        category: "Fashion",
        subcategory: "Men's Clothing",
        price: 1_799,
        original_price: 3_599,
        stock: 60,
        rating: 4.3,
        reviews: 5_410,
        tags: &["bestseller"],
        age_days: 400,
        description: "Slim fit stretch denim that sits below the waist.",
        specs: &[("Fit", "Slim"), ("Fabric", "99% cotton, 1% elastane")],
        features: &["Machine washable", "Five-pocket styling"],
    },
    SeedProduct {
        name: "Allen Solly Men's Polo T-Shirt",
        brand: "Allen Solly",
        category: "Fashion",
        subcategory: "Men's Clothing",
        price: 699,
        original_price: 1_299,
        stock: 120,
        rating: 4.2,
        reviews: 3_120,
        tags: &[],
        age_days: 150,
        description: "Regular fit cotton polo for work and weekends.",
        specs: &[("Fit", "Regular"), ("Fabric", "100% cotton")],
        features: &["Ribbed collar", "Breathable pique knit"],
    },
    SeedProduct {
        name: "Biba Women's Cotton Kurta",
        brand: "Biba",
        category: "Fashion",
        subcategory: "Women's Clothing",
        price: 1_249,
        original_price: 2_499,
        stock: 40,
        rating: 4.4,
        reviews: 2_210,
        tags: &["new"],
        age_days: 7,
        description: "Straight printed kurta in soft cotton with three-quarter sleeves.",
        specs: &[("Length", "Calf length"), ("Fabric", "Cotton")],
        features: &["Hand block inspired print", "Side slits"],
    },
    SeedProduct {
        name: "Puma Men's Running Shoes",
        brand: "Puma",
        category: "Fashion",
        subcategory: "Footwear",
        price: 2_499,
        original_price: 5_999,
        stock: 15,
        rating: 4.2,
        reviews: 4_380,
        tags: &["deal"],
        age_days: 60,
        description: "Lightweight running shoes with SoftFoam+ cushioning.",
        specs: &[("Sole", "Rubber"), ("Closure", "Lace-up")],
        features: &["SoftFoam+ sockliner", "Breathable mesh upper"],
    },
    SeedProduct {
        name: "Prestige Induction Cooktop",
        brand: "Prestige",
        category: "Home & Kitchen",
        subcategory: "Appliances",
        price: 2_199,
        original_price: 3_695,
        stock: 55,
        rating: 4.1,
        reviews: 11_230,
        tags: &["bestseller"],
        age_days: 500,
        description: "1200W induction cooktop with Indian menu presets.",
        specs: &[("Power", "1200 W"), ("Controls", "Push button")],
        features: &["Automatic voltage regulator", "Anti-magnetic wall"],
    },
    SeedProduct {
        name: "Philips Air Fryer HD9252",
        brand: "Philips",
        category: "Home & Kitchen",
        subcategory: "Appliances",
        price: 6_999,
        original_price: 9_995,
        stock: 22,
        rating: 4.5,
        reviews: 6_870,
        tags: &["new"],
        age_days: 14,
        description: "4.1 litre air fryer using Rapid Air technology for up to 90% less fat.",
        specs: &[("Capacity", "4.1 L"), ("Power", "1400 W")],
        features: &["Touch screen presets", "Dishwasher-safe basket"],
    },
    SeedProduct {
        name: "Hawkins Contura Pressure Cooker 3L",
        brand: "Hawkins",
        category: "Home & Kitchen",
        subcategory: "Cookware",
        price: 1_890,
        original_price: 2_250,
        stock: 85,
        rating: 4.6,
        reviews: 15_630,
        tags: &["bestseller"],
        age_days: 700,
        description: "Hard anodised pressure cooker that works on gas and induction.",
        specs: &[("Capacity", "3 L"), ("Material", "Hard anodised aluminium")],
        features: &["Induction compatible", "5 year warranty"],
    },
    SeedProduct {
        name: "Ajanta Quartz Wall Clock",
        brand: "Ajanta",
        category: "Home & Kitchen",
        subcategory: "Home Decor",
        price: 499,
        original_price: 999,
        stock: 5,
        rating: 4.0,
        reviews: 980,
        tags: &[],
        age_days: 330,
        description: "Silent sweep wall clock with a 12 inch dial.",
        specs: &[("Dial", "12 inch"), ("Movement", "Silent sweep")],
        features: &["No ticking sound"],
    },
    SeedProduct {
        name: "The Psychology of Money",
        brand: "Jaico Publishing",
        category: "Books",
        subcategory: "Non-Fiction",
        price: 299,
        original_price: 399,
        stock: 300,
        rating: 4.6,
        reviews: 52_310,
        tags: &["bestseller"],
        age_days: 900,
        description: "Timeless lessons on wealth, greed and happiness by Morgan Housel.",
        specs: &[("Author", "Morgan Housel"), ("Pages", "252"), ("Language", "English")],
        features: &["Paperback"],
    },
    SeedProduct {
        name: "The White Tiger",
        brand: "HarperCollins",
        category: "Books",
        subcategory: "Fiction",
        price: 279,
        original_price: 399,
        stock: 140,
        rating: 4.2,
        reviews: 8_760,
        tags: &[],
        age_days: 1_000,
        description: "Aravind Adiga's Booker Prize winning debut novel.",
        specs: &[("Author", "Aravind Adiga"), ("Pages", "336"), ("Language", "English")],
        features: &["Paperback"],
    },
    SeedProduct {
        name: "Mamaearth Vitamin C Face Wash",
        brand: "Mamaearth",
        category: "Beauty & Personal Care",
        subcategory: "Skincare",
        price: 249,
        original_price: 349,
        stock: 500,
        rating: 4.1,
        reviews: 21_450,
        tags: &[],
        age_days: 240,
        description: "Vitamin C and turmeric face wash for brighter skin.",
        specs: &[("Volume", "100 ml"), ("Skin type", "All")],
        features: &["Free of sulphates and parabens"],
    },
    SeedProduct {
        name: "Philips BT3221 Beard Trimmer",
        brand: "Philips",
        category: "Beauty & Personal Care",
        subcategory: "Grooming",
        price: 1_399,
        original_price: 1_995,
        stock: 95,
        rating: 4.3,
        reviews: 30_120,
        tags: &["bestseller"],
        age_days: 365,
        description: "Cordless trimmer with 20 length settings and 90 minutes of runtime.",
        specs: &[("Runtime", "90 minutes"), ("Length settings", "20")],
        features: &["Self-sharpening blades", "USB charging"],
    },
    SeedProduct {
        name: "Boldfit Yoga Mat 6mm",
        brand: "Boldfit",
        category: "Sports & Fitness",
        subcategory: "Fitness Equipment",
        price: 499,
        original_price: 1_299,
        stock: 180,
        rating: 4.2,
        reviews: 9_870,
        tags: &["deal", "new"],
        age_days: 3,
        description: "Anti-slip EVA yoga mat with a carry strap.",
        specs: &[("Thickness", "6 mm"), ("Material", "EVA")],
        features: &["Anti-slip texture", "Carry strap included"],
    },
    SeedProduct {
        name: "Cosco Kashmir Willow Cricket Bat",
        brand: "Cosco",
        category: "Sports & Fitness",
        subcategory: "Outdoor",
        price: 1_299,
        original_price: 1_999,
        stock: 0,
        rating: 3.9,
        reviews: 640,
        tags: &[],
        age_days: 180,
        description: "Full size Kashmir willow bat for tennis and leather ball practice.",
        specs: &[("Size", "Full size"), ("Willow", "Kashmir")],
        features: &["Cane handle", "Toe guard"],
    },
];

/// Build the full seed data set.
#[must_use]
pub fn seed_data(now: DateTime<Utc>) -> StoreData {
    let settings = StoreSettings::default();
    let categories = categories();
    let products = products(now);
    let users = users(now);
    let orders = orders(now, &products, &users, &settings.pricing);

    let mut data = StoreData {
        categories,
        products,
        coupons: coupons(now),
        users,
        orders,
        settings,
        sequences: crate::data::Sequences::default(),
    };
    data.sync_sequences();
    data
}

fn categories() -> Vec<Category> {
    CATEGORIES
        .iter()
        .zip(1..)
        .map(|((name, subcategories), id)| Category {
            id: CategoryId::new(id),
            name: (*name).to_owned(),
            slug: slugify(name),
            image: PLACEHOLDER_IMAGE.to_owned(),
            subcategories: subcategories
                .iter()
                .map(|s| Subcategory {
                    name: (*s).to_owned(),
                    slug: slugify(s),
                })
                .collect(),
        })
        .collect()
}

fn products(now: DateTime<Utc>) -> Vec<Product> {
    PRODUCTS
        .iter()
        .zip(1..)
        .map(|(p, id)| {
            let price = Price::from_rupees(p.price);
            let original_price = Price::from_rupees(p.original_price);
            let created_at = now - Duration::days(p.age_days);
            let prefix: String = p
                .category
                .chars()
                .filter(char::is_ascii_alphabetic)
                .take(3)
                .flat_map(|c| c.to_uppercase())
                .collect();
            Product {
                id: ProductId::new(id),
                name: p.name.to_owned(),
                slug: slugify(p.name),
                sku: format!("TTD-{prefix}-{id:04}"),
                description: p.description.to_owned(),
                price,
                original_price,
                discount: discount_percent(price, original_price),
                images: vec![PLACEHOLDER_IMAGE.to_owned()],
                category: p.category.to_owned(),
                subcategory: p.subcategory.to_owned(),
                brand: p.brand.to_owned(),
                rating: p.rating,
                review_count: p.reviews,
                stock: p.stock,
                specifications: p
                    .specs
                    .iter()
                    .map(|(name, value)| Specification {
                        name: (*name).to_owned(),
                        value: (*value).to_owned(),
                    })
                    .collect(),
                features: p.features.iter().map(|f| (*f).to_owned()).collect(),
                tags: p.tags.iter().map(|t| (*t).to_owned()).collect(),
                created_at,
                updated_at: created_at,
            }
        })
        .collect()
}

fn coupons(now: DateTime<Utc>) -> Vec<Coupon> {
    let coupon = |code: &str, description: &str, kind: CouponKind, value: i64, min: i64, cap: Option<i64>| Coupon {
        code: code.to_owned(),
        description: description.to_owned(),
        kind,
        value: Decimal::from(value),
        min_purchase: Price::from_rupees(min),
        max_discount: cap.map(Price::from_rupees),
        valid_from: now - Duration::days(30),
        valid_to: now + Duration::days(365),
        usage_limit: Some(1_000),
        used_count: 0,
    };
    let mut expired = coupon(
        "MONSOON50",
        "Monsoon sale, 50% off",
        CouponKind::Percentage,
        50,
        999,
        Some(2_000),
    );
    expired.valid_from = now - Duration::days(120);
    expired.valid_to = now - Duration::days(60);

    vec![
        coupon("SAVE10", "10% off on orders above ₹500", CouponKind::Percentage, 10, 500, Some(500)),
        coupon("FIRST20", "20% off your first order above ₹1,000", CouponKind::Percentage, 20, 1_000, Some(1_000)),
        coupon("SHOPINDIA", "15% off on orders above ₹2,000", CouponKind::Percentage, 15, 2_000, Some(1_500)),
        coupon("FLAT200", "Flat ₹200 off on orders above ₹1,500", CouponKind::Fixed, 200, 1_500, None),
        expired,
    ]
}

struct SeedUser {
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    role: UserRole,
    status: CustomerStatus,
    city: &'static str,
    state: &'static str,
    pincode: &'static str,
    street: &'static str,
}

const USERS: &[SeedUser] = &[
    SeedUser {
        name: "Demo User",
        email: DEMO_EMAIL,
        phone: "9876543210",
        role: UserRole::User,
        status: CustomerStatus::Active,
        city: "Mumbai",
        state: "Maharashtra",
        pincode: "400001",
        street: "Flat 402, Sea View Apartments, Marine Drive",
    },
    SeedUser {
        name: "Priya Sharma",
        email: "priya.sharma@example.in",
        phone: "9812345678",
        role: UserRole::User,
        status: CustomerStatus::Active,
        city: "Pune",
        state: "Maharashtra",
        pincode: "411001",
        street: "12 MG Road, Camp",
    },
    SeedUser {
        name: "Rahul Verma",
        email: "rahul.verma@example.in",
        phone: "9898989898",
        role: UserRole::User,
        status: CustomerStatus::Active,
        city: "New Delhi",
        state: "Delhi",
        pincode: "110001",
        street: "45 Connaught Place",
    },
    SeedUser {
        name: "Anita Desai",
        email: "anita.desai@example.in",
        phone: "9765432109",
        role: UserRole::User,
        status: CustomerStatus::Active,
        city: "Ahmedabad",
        state: "Gujarat",
        pincode: "380009",
        street: "7 CG Road, Navrangpura",
    },
    SeedUser {
        name: "Vikram Singh",
        email: "vikram.singh@example.in",
        phone: "9123456780",
        role: UserRole::User,
        status: CustomerStatus::Inactive,
        city: "Jaipur",
        state: "Rajasthan",
        pincode: "302001",
        street: "22 MI Road",
    },
    SeedUser {
        name: "Store Admin",
        email: ADMIN_EMAIL,
        phone: "9000000001",
        role: UserRole::Admin,
        status: CustomerStatus::Active,
        city: "Mumbai",
        state: "Maharashtra",
        pincode: "400051",
        street: "TTD Software, Bandra Kurla Complex",
    },
];

fn users(now: DateTime<Utc>) -> Vec<User> {
    let mut next_address = 0;
    let mut users: Vec<User> = USERS
        .iter()
        .zip(1..)
        .filter_map(|(u, id)| {
            let email = Email::parse(u.email).ok()?;
            next_address += 1;
            let home = Address {
                id: AddressId::new(next_address),
                name: AddressType::Home.label().to_owned(),
                full_name: u.name.to_owned(),
                phone: u.phone.to_owned(),
                address_line1: u.street.to_owned(),
                address_line2: None,
                landmark: None,
                city: u.city.to_owned(),
                state: u.state.to_owned(),
                pincode: u.pincode.to_owned(),
                is_default: true,
                kind: AddressType::Home,
            };
            let created_at = now - Duration::days(400 - i64::from(id) * 30);
            Some(User {
                id: UserId::new(id),
                name: u.name.to_owned(),
                email,
                phone: u.phone.to_owned(),
                avatar: None,
                addresses: vec![home],
                role: u.role,
                status: u.status,
                saved_cards: Vec::new(),
                saved_upi: Vec::new(),
                preferences: NotificationPreferences::default(),
                created_at,
                last_login_at: None,
            })
        })
        .collect();

    // The demo customer gets a second address and saved payment methods.
    if let Some(demo) = users.first_mut() {
        next_address += 1;
        demo.addresses.push(Address {
            id: AddressId::new(next_address),
            name: AddressType::Work.label().to_owned(),
            full_name: demo.name.clone(),
            phone: demo.phone.clone(),
            address_line1: "3rd Floor, Prestige Tech Park".to_owned(),
            address_line2: Some("Outer Ring Road, Marathahalli".to_owned()),
            landmark: Some("Opposite Innovative Multiplex".to_owned()),
            city: "Bengaluru".to_owned(),
            state: "Karnataka".to_owned(),
            pincode: "560103".to_owned(),
            is_default: false,
            kind: AddressType::Work,
        });
        demo.saved_cards.push(SavedCard {
            id: SavedPaymentId::new(1),
            brand: CardBrand::Visa,
            last_four: "4242".to_owned(),
            expiry_month: "08".to_owned(),
            expiry_year: "29".to_owned(),
            holder_name: "DEMO USER".to_owned(),
            is_default: true,
        });
        demo.saved_upi.push(SavedUpi {
            id: SavedPaymentId::new(2),
            upi_id: "demo@okicici".to_owned(),
            is_default: true,
        });
    }
    users
}

struct SeedOrder {
    suffix: &'static str,
    user: usize,
    items: &'static [(usize, u32)],
    method: PaymentMethod,
    status: OrderStatus,
    days_ago: i64,
    coupon: Option<(&'static str, i64)>,
}

const ORDERS: &[SeedOrder] = &[
    SeedOrder {
        suffix: "7KQ2M9",
        user: 0,
        items: &[(4, 1), (15, 2)],
        method: PaymentMethod::Upi,
        status: OrderStatus::Delivered,
        days_ago: 20,
        coupon: Some(("SAVE10", 190)),
    },
    SeedOrder {
        suffix: "X4B8TN",
        user: 0,
        items: &[(0, 1)],
        method: PaymentMethod::Card,
        status: OrderStatus::Shipped,
        days_ago: 3,
        coupon: None,
    },
    SeedOrder {
        suffix: "P9D3RA",
        user: 0,
        items: &[(13, 1)],
        method: PaymentMethod::Cod,
        status: OrderStatus::Pending,
        days_ago: 0,
        coupon: None,
    },
    SeedOrder {
        suffix: "M2H6WE",
        user: 1,
        items: &[(7, 2), (8, 1)],
        method: PaymentMethod::Upi,
        status: OrderStatus::Processing,
        days_ago: 1,
        coupon: None,
    },
    SeedOrder {
        suffix: "C8L1VZ",
        user: 2,
        items: &[(5, 1)],
        method: PaymentMethod::Card,
        status: OrderStatus::Delivered,
        days_ago: 12,
        coupon: Some(("SHOPINDIA", 1_500)),
    },
    SeedOrder {
        suffix: "T5N7QJ",
        user: 3,
        items: &[(12, 1)],
        method: PaymentMethod::NetBanking,
        status: OrderStatus::Cancelled,
        days_ago: 6,
        coupon: None,
    },
    SeedOrder {
        suffix: "G3F9YK",
        user: 1,
        items: &[(18, 1)],
        method: PaymentMethod::Wallet,
        status: OrderStatus::Confirmed,
        days_ago: 0,
        coupon: None,
    },
    SeedOrder {
        suffix: "R6S2UD",
        user: 2,
        items: &[(19, 2), (17, 1)],
        method: PaymentMethod::Cod,
        status: OrderStatus::OutForDelivery,
        days_ago: 2,
        coupon: None,
    },
    SeedOrder {
        suffix: "B1V4XP",
        user: 4,
        items: &[(9, 1)],
        method: PaymentMethod::Upi,
        status: OrderStatus::Returned,
        days_ago: 30,
        coupon: None,
    },
];

fn orders(
    now: DateTime<Utc>,
    products: &[Product],
    users: &[User],
    pricing: &PricingPolicy,
) -> Vec<Order> {
    ORDERS
        .iter()
        .zip(1..)
        .filter_map(|(o, id)| {
            let user = users.get(o.user)?;
            let address = user.addresses.first()?.clone();
            let items: Vec<OrderItem> = o
                .items
                .iter()
                .filter_map(|(index, quantity)| {
                    let product = products.get(*index)?.clone();
                    Some(OrderItem {
                        price: product.price,
                        product,
                        quantity: *quantity,
                    })
                })
                .collect();
            let subtotal: Price = items.iter().map(OrderItem::line_total).sum();
            let item_count = items.iter().map(|i| i.quantity).sum();
            let discount = o.coupon.map_or(Price::ZERO, |(_, d)| Price::from_rupees(d));
            let totals =
                pricing.totals_for_subtotal(subtotal, item_count, discount, Some(&address.state));
            let created_at = now - Duration::days(o.days_ago) - Duration::hours(i64::from(id));

            let payment_status = match (o.method, o.status) {
                (_, OrderStatus::Cancelled | OrderStatus::Returned) => PaymentStatus::Refunded,
                (PaymentMethod::Cod, OrderStatus::Delivered) => PaymentStatus::Paid,
                (PaymentMethod::Cod, _) => PaymentStatus::Pending,
                _ => PaymentStatus::Paid,
            };
            let shipped = matches!(
                o.status,
                OrderStatus::Shipped | OrderStatus::OutForDelivery | OrderStatus::Delivered
            );

            Some(Order {
                id: OrderId::new(id),
                order_number: format!("ORD-{}-{}", created_at.year(), o.suffix),
                user_id: user.id,
                items,
                shipping_address: address.clone(),
                billing_address: address,
                payment_method: o.method,
                payment_status,
                order_status: o.status,
                upi_id: (o.method == PaymentMethod::Upi).then(|| format!("{}@okaxis", user.email.local_part())),
                subtotal: totals.subtotal,
                gst: totals.gst.total_gst,
                delivery_charge: totals.delivery_charge,
                discount: totals.discount,
                total: totals.total,
                coupon_code: o.coupon.map(|(code, _)| code.to_owned()),
                tracking_number: shipped.then(|| format!("TTD{:010}", 4_000_000_000_i64 + i64::from(id))),
                estimated_delivery: Some(estimated_delivery(created_at)),
                created_at,
                updated_at: created_at,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_seed_is_consistent() {
        let data = seed_data(Utc::now());

        let slugs: HashSet<&str> = data.products.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs.len(), data.products.len());

        let category_names: HashSet<&str> =
            data.categories.iter().map(|c| c.name.as_str()).collect();
        assert!(data.products.iter().all(|p| category_names.contains(p.category.as_str())));

        assert_eq!(data.orders.len(), ORDERS.len());
        assert!(data.orders.iter().all(|o| !o.items.is_empty()));
        assert_eq!(data.sequences.product, i32::try_from(PRODUCTS.len()).unwrap());
    }

    #[test]
    fn test_seed_has_admin_and_demo_accounts() {
        let data = seed_data(Utc::now());
        let admin = data.users.iter().find(|u| u.email.matches(ADMIN_EMAIL)).unwrap();
        assert!(admin.is_admin());
        let demo = data.users.iter().find(|u| u.email.matches(DEMO_EMAIL)).unwrap();
        assert_eq!(demo.addresses.len(), 2);
        assert_eq!(demo.addresses.iter().filter(|a| a.is_default).count(), 1);
    }

    #[test]
    fn test_seed_orders_follow_pricing() {
        let data = seed_data(Utc::now());
        for order in &data.orders {
            assert_eq!(
                order.total,
                (order.subtotal + order.gst + order.delivery_charge).saturating_sub(order.discount)
            );
        }
    }

    #[test]
    fn test_seed_coupons_include_expired() {
        let now = Utc::now();
        let data = seed_data(now);
        let expired = data.coupons.iter().find(|c| c.code == "MONSOON50").unwrap();
        assert!(expired.valid_to < now);
    }
}
