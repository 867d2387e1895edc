// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Sample pipe wiring for the standalone binary: a four-pipe diamond
//! (`A` feeds `B` and `C`, `D` depends on both `A` and `C`) exercising
//! multi-product pipes, static products, and a diamond dependency
//! shape. Replace this with your own pipe declarations; the engine
//! itself has no notion of what `A`..`D` mean.

use warp_domain::entities::{Pipe, PipeBuilder, ProductDependency};
use warp_domain::value_objects::{Parameter, ParameterValue, Product, ProductValue};

pub fn demo_pipes() -> Vec<(Pipe, bool)> {
    vec![(pipe_a(), false), (pipe_b(), false), (pipe_c(), false), (pipe_d(), false)]
}

fn pipe_a() -> Pipe {
    PipeBuilder::new("A")
        .source_file("pipes/a.rs", "fn a() {}")
        .parameter(Parameter::new("message1", ParameterValue::String("MESSAGE1_DEFAULT".into())))
        .parameter(Parameter::new("message2", ParameterValue::String("MESSAGE2_DEFAULT".into())))
        .product(Product::new("data/a1.txt"))
        .product(Product::new("data/a2.txt"))
        .action(|ctx| {
            let message1 = ctx.param("message1").and_then(|v| v.as_str()).unwrap_or_default().to_string();
            let message2 = ctx.param("message2").and_then(|v| v.as_str()).unwrap_or_default().to_string();
            ctx.set_output("data/a1.txt", ProductValue::Text(message1));
            ctx.set_output("data/a2.txt", ProductValue::Text(message2));
            Ok(())
        })
        .build()
        .unwrap_or_else(|e| panic!("pipe A is malformed: {e}"))
}

fn pipe_b() -> Pipe {
    PipeBuilder::new("B")
        .source_file("pipes/b.rs", "fn b() {}")
        .parameter(Parameter::new("message", ParameterValue::String("test_B".into())))
        .depends_on(ProductDependency::new("a1", "data/a1.txt"))
        .depends_on(ProductDependency::new("a2", "data/a2.txt"))
        .product(Product::new("data/b.txt").with_static(true))
        .action(|ctx| {
            let a1 = ctx.input("a1").and_then(|v| v.as_value()).and_then(|v| v.as_text()).unwrap_or_default();
            let a2 = ctx.input("a2").and_then(|v| v.as_value()).and_then(|v| v.as_text()).unwrap_or_default();
            let message = ctx.param("message").and_then(|v| v.as_str()).unwrap_or_default().to_string();
            ctx.set_output("data/b.txt", ProductValue::Text(format!("{message}: {a1}/{a2}")));
            Ok(())
        })
        .build()
        .unwrap_or_else(|e| panic!("pipe B is malformed: {e}"))
}

fn pipe_c() -> Pipe {
    PipeBuilder::new("C")
        .source_file("pipes/c.rs", "fn c() {}")
        .parameter(Parameter::new("message", ParameterValue::String("test_C".into())))
        .depends_on(ProductDependency::new("a2", "data/a2.txt"))
        .product(Product::new("data/c.txt").with_static(true))
        .action(|ctx| {
            let a2 = ctx.input("a2").and_then(|v| v.as_value()).and_then(|v| v.as_text()).unwrap_or_default();
            let message = ctx.param("message").and_then(|v| v.as_str()).unwrap_or_default().to_string();
            ctx.set_output("data/c.txt", ProductValue::Text(format!("{message}: {a2}")));
            Ok(())
        })
        .build()
        .unwrap_or_else(|e| panic!("pipe C is malformed: {e}"))
}

fn pipe_d() -> Pipe {
    PipeBuilder::new("D")
        .source_file("pipes/d.rs", "fn d() {}")
        .depends_on(ProductDependency::new("a2", "data/a2.txt"))
        .depends_on(ProductDependency::new("c", "data/c.txt"))
        .product(Product::new("data/d.txt"))
        .action(|ctx| {
            let a2 = ctx.input("a2").and_then(|v| v.as_value()).and_then(|v| v.as_text()).unwrap_or_default();
            let c = ctx.input("c").and_then(|v| v.as_value()).and_then(|v| v.as_text()).unwrap_or_default();
            ctx.set_output("data/d.txt", ProductValue::Text(format!("{a2} + {c}")));
            Ok(())
        })
        .build()
        .unwrap_or_else(|e| panic!("pipe D is malformed: {e}"))
}
