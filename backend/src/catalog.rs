use car_price_inference::ValidationError;
use serde::Serialize;

/// A car the page can show. The choice is display-only and never reaches the model.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct CarModel {
    pub name: &'static str,
    pub image_url: &'static str,
}

pub const CARS: &[CarModel] = &[
    CarModel {
        name: "Audi A6",
        image_url: "https://cdn.motor1.com/images/mgl/8MMpmx/s1/2024-audi-a6.jpg",
    },
    CarModel {
        name: "BMW 3 Series",
        image_url: "https://cdn.motor1.com/images/mgl/kn6X9/s1/2023-bmw-3-series-sedan-front-view.jpg",
    },
    CarModel {
        name: "Mercedes C-Class",
        image_url: "https://cdn.motor1.com/images/mgl/xBBpY/s1/mercedes-c-class-sedan-front-view.jpg",
    },
    CarModel {
        name: "Toyota Corolla",
        image_url: "https://cdn.motor1.com/images/mgl/6Z8ep/s1/toyota-corolla.jpg",
    },
    CarModel {
        name: "Volkswagen Polo",
        image_url: "https://cdn.motor1.com/images/mgl/vAApN/s1/vw-polo.jpg",
    },
    CarModel {
        name: "Hyundai i20",
        image_url: "https://cdn.motor1.com/images/mgl/1BB8Q/s1/hyundai-i20-front-view.jpg",
    },
    CarModel {
        name: "Ford Figo",
        image_url: "https://cdn.motor1.com/images/mgl/W33gJ/s1/ford-figo.jpg",
    },
];

pub fn find(name: &str) -> Option<&'static CarModel> {
    let name = name.trim();
    CARS.iter().find(|car| car.name.eq_ignore_ascii_case(name))
}

pub fn lookup(name: &str) -> Result<&'static CarModel, ValidationError> {
    find(name).ok_or_else(|| ValidationError::UnknownOption {
        field: "car_name",
        value: name.to_string(),
        allowed: CARS.iter().map(|c| c.name).collect::<Vec<_>>().join(", "),
    })
}
