//! Request routing
//!
//! Maps a method and path onto a [`Route`]. JSON endpoints live under `/api`;
//! the remaining paths are HTML pages and the dashboard redirect.

use hyper::Method;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Register,
    Login,
    Logout,
    Me,

    ListSuppliers,
    GetSupplier(String),
    CreateSupplier,
    UpdateSupplier(String),
    DeleteSupplier(String),

    ListProducts,
    GetProduct(String),
    CreateProduct,
    UpdateProduct(String),
    DeleteProduct(String),

    ListInventory,
    GetInventory(String),
    InventoryByProduct(String),
    CreateInventory,
    UpdateInventory(String),
    PatchStock(String),
    DeleteInventory(String),
    LowStock,

    ListOrders,
    GetOrder(String),
    CreateOrder,
    UpdateOrder(String),
    PatchStatus(String),
    DeleteOrder(String),

    /// Role-based redirect
    Dashboard,
    /// HTML file under the public directory
    Page(&'static str),
}

impl Route {
    /// Match a request line; `None` means no such route
    pub fn resolve(method: &Method, path: &str) -> Option<Route> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["api", rest @ ..] => Self::api(method, rest),
            rest if *method == Method::GET => Self::page(rest),
            _ => None,
        }
    }

    /// Whether the route needs a resolved principal
    pub fn is_guarded(&self) -> bool {
        !matches!(
            self,
            Route::Register
                | Route::Login
                | Route::Logout
                | Route::Me
                | Route::Dashboard
                | Route::Page(_)
        )
    }

    fn api(method: &Method, segments: &[&str]) -> Option<Route> {
        let id = |s: &&str| s.to_string();
        let route = match (method, segments) {
            (&Method::POST, ["auth", "register"]) => Route::Register,
            (&Method::POST, ["auth", "login"]) => Route::Login,
            (&Method::POST, ["auth", "logout"]) => Route::Logout,
            (&Method::GET, ["auth", "me"]) => Route::Me,

            (&Method::GET, ["suppliers"]) => Route::ListSuppliers,
            (&Method::POST, ["suppliers"]) => Route::CreateSupplier,
            (&Method::GET, ["suppliers", s]) => Route::GetSupplier(id(s)),
            (&Method::PUT, ["suppliers", s]) => Route::UpdateSupplier(id(s)),
            (&Method::DELETE, ["suppliers", s]) => Route::DeleteSupplier(id(s)),

            (&Method::GET, ["products"]) => Route::ListProducts,
            (&Method::POST, ["products"]) => Route::CreateProduct,
            (&Method::GET, ["products", s]) => Route::GetProduct(id(s)),
            (&Method::PUT, ["products", s]) => Route::UpdateProduct(id(s)),
            (&Method::DELETE, ["products", s]) => Route::DeleteProduct(id(s)),

            (&Method::GET, ["inventory"]) => Route::ListInventory,
            (&Method::POST, ["inventory"]) => Route::CreateInventory,
            (&Method::GET, ["inventory", "low-stock", "items"]) => Route::LowStock,
            (&Method::GET, ["inventory", "product", p]) => Route::InventoryByProduct(id(p)),
            (&Method::GET, ["inventory", s]) => Route::GetInventory(id(s)),
            (&Method::PUT, ["inventory", s]) => Route::UpdateInventory(id(s)),
            (&Method::PATCH, ["inventory", s, "stock"]) => Route::PatchStock(id(s)),
            (&Method::DELETE, ["inventory", s]) => Route::DeleteInventory(id(s)),

            (&Method::GET, ["orders"]) => Route::ListOrders,
            (&Method::POST, ["orders"]) => Route::CreateOrder,
            (&Method::GET, ["orders", s]) => Route::GetOrder(id(s)),
            (&Method::PUT, ["orders", s]) => Route::UpdateOrder(id(s)),
            (&Method::PATCH, ["orders", s, "status"]) => Route::PatchStatus(id(s)),
            (&Method::DELETE, ["orders", s]) => Route::DeleteOrder(id(s)),

            _ => return None,
        };
        Some(route)
    }

    fn page(segments: &[&str]) -> Option<Route> {
        let file = match segments {
            [] => "index.html",
            ["login"] => "login.html",
            ["register"] => "register.html",
            ["dashboard"] => return Some(Route::Dashboard),
            ["admin-dashboard"] => "admin-dashboard.html",
            ["user-dashboard"] => "user-dashboard.html",
            ["suppliers"] => "suppliers.html",
            ["products"] => "products.html",
            ["orders"] => "orders.html",
            ["inventory"] => "inventory.html",
            _ => return None,
        };
        Some(Route::Page(file))
    }
}
